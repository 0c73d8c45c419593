use std::path::PathBuf;

use crate::path::PathError;

/// Error type for config loading failures (parse errors, IO errors, etc.)
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read '{}': {error}", path.display())]
    Io { path: PathBuf, error: std::io::Error },

    #[error("Failed to parse '{}': {}", path.display(), error.message())]
    Parse {
        path: PathBuf,
        content: String,
        error: toml::de::Error,
    },

    #[error("Invalid value in ${var}: {error}")]
    Env { var: String, error: PathError },

    #[error("Failed to write '{}': {error}", path.display())]
    Write { path: PathBuf, error: std::io::Error },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file '{}' already exists", path.display())]
    Exists { path: PathBuf },
}

/// Render a load error for the terminal.
///
/// Parse errors with a known location are shown with the offending source
/// line via Ariadne; everything else falls back to the `Display` message.
pub fn format_load_error(err: &LoadError) -> String {
    use ariadne::Config;
    use ariadne::Label;
    use ariadne::Report;
    use ariadne::ReportKind;
    use ariadne::Source;

    let LoadError::Parse {
        path,
        content,
        error,
    } = err
    else {
        return format!("{err}\n");
    };
    let Some(span) = error.span() else {
        return format!("{err}\n");
    };

    let file_id = path.to_string_lossy().to_string();
    let mut output = Vec::new();
    let written = Report::build(ReportKind::Error, (file_id.clone(), span.clone()))
        .with_config(Config::default().with_color(false))
        .with_message("Failed to parse config file")
        .with_label(Label::new((file_id.clone(), span)).with_message(error.message()))
        .finish()
        .write((file_id, Source::from(content)), &mut output);

    match written {
        Ok(()) => String::from_utf8_lossy(&output).to_string(),
        Err(_) => format!("{err}\n"),
    }
}
