//! Terminal rendering of command results and listings.

use std::fmt::Display;
use std::io;
use std::io::Write;

use crate::hub::filter::Tree;

pub fn success_action(out: &mut impl Write, entity: &str, state: &str) -> io::Result<()> {
    writeln!(out, "✓ {entity} {state}")
}

pub fn success(out: &mut impl Write, msg: &str) -> io::Result<()> {
    writeln!(out, "✓ {msg}")
}

pub fn error(out: &mut impl Write, err: &dyn Display) -> io::Result<()> {
    writeln!(out, "✗ {err}")
}

/// Print `tree` below `title`, one branch per domain.
pub fn tree(out: &mut impl Write, title: &str, tree: &Tree) -> io::Result<()> {
    writeln!(out, "{title}")?;
    let mut domains = tree.iter().peekable();
    while let Some((domain, names)) = domains.next() {
        let last_domain = domains.peek().is_none();
        let (branch, indent) = if last_domain {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        writeln!(out, "{branch}{domain}")?;

        let mut names = names.iter().peekable();
        while let Some(name) = names.next() {
            let leaf = if names.peek().is_none() { "└── " } else { "├── " };
            writeln!(out, "{indent}{leaf}{name}")?;
        }
    }
    Ok(())
}
