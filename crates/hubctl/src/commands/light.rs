use std::fmt;
use std::str::FromStr;

use serde_json::json;
use serde_json::Map;
use tracing::debug;

use super::CommandResult;
use super::Controller;
use crate::convert;
use crate::error::Error;
use crate::error::Result;
use crate::hub::Service;
use crate::hub::Transport;
use crate::resolve::Resolved;
use crate::resolve::Target;

/// A brightness as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessLevel {
    /// `+`: up to the next multiple of ten percent.
    Up,
    /// `-`: down to the previous multiple of ten percent.
    Down,
    /// `min`, `mid`, `max` or `1`-`99`.
    Percent(u8),
}

impl FromStr for BrightnessLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "+" => Ok(BrightnessLevel::Up),
            "-" => Ok(BrightnessLevel::Down),
            "min" => Ok(BrightnessLevel::Percent(convert::PERCENT_MIN)),
            "mid" => Ok(BrightnessLevel::Percent(50)),
            "max" => Ok(BrightnessLevel::Percent(convert::PERCENT_MAX)),
            _ => s
                .parse::<u8>()
                .ok()
                .filter(|p| (convert::PERCENT_MIN..=convert::PERCENT_MAX).contains(p))
                .map(BrightnessLevel::Percent)
                .ok_or_else(|| Error::invalid("brightness", "needs to be 1-99, or +/-/min/mid/max")),
        }
    }
}

impl BrightnessLevel {
    /// Reject a `Percent` outside 1-99, which `FromStr` never builds.
    fn check(self) -> Result<()> {
        match self {
            BrightnessLevel::Percent(p) if !(convert::PERCENT_MIN..=convert::PERCENT_MAX).contains(&p) => {
                Err(Error::invalid("brightness", "needs to be 1-99, or +/-/min/mid/max"))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for BrightnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrightnessLevel::Up => write!(f, "+"),
            BrightnessLevel::Down => write!(f, "-"),
            BrightnessLevel::Percent(p) => write!(f, "{p}%"),
        }
    }
}

/// Optional settings for `turn_on_custom`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightOptions {
    pub brightness: Option<BrightnessLevel>,
    pub color: Option<[u8; 3]>,
    /// Color temperature in Kelvin.
    pub color_temp: Option<u32>,
}

impl<T: Transport> Controller<T> {
    pub async fn set_brightness(&self, target: &Target, level: BrightnessLevel) -> Result<CommandResult> {
        level.check()?;
        let resolved = self.prepare(target, Service::TurnOn).await?;

        let mut fields = Map::new();
        let state = match self.brightness_percent(&resolved, level).await? {
            Some(percent) => {
                fields.insert("brightness".to_string(), json!(convert::percent_to_raw(percent)));
                format!("brightness set to {percent}%")
            }
            None => "on".to_string(),
        };

        self.call(&resolved, Service::TurnOn, fields).await?;
        Ok(CommandResult::new(resolved, state))
    }

    /// Turn a light on with any combination of brightness and one of color or
    /// color temperature.
    pub async fn turn_on_custom(&self, target: &Target, options: &LightOptions) -> Result<CommandResult> {
        if options.color.is_some() && options.color_temp.is_some() {
            return Err(Error::ColorConflict);
        }
        if let Some(level) = options.brightness {
            level.check()?;
        }
        let mired = options
            .color_temp
            .map(convert::color_temp_from_kelvin)
            .transpose()?;

        let resolved = self.prepare(target, Service::TurnOn).await?;

        let mut fields = Map::new();
        if let Some(level) = options.brightness {
            if let Some(percent) = self.brightness_percent(&resolved, level).await? {
                fields.insert("brightness".to_string(), json!(convert::percent_to_raw(percent)));
            }
        }
        if let Some(rgb) = options.color {
            fields.insert("rgb_color".to_string(), json!(rgb));
        }
        if let Some(mired) = mired {
            fields.insert("color_temp".to_string(), json!(mired));
        }

        self.call(&resolved, Service::TurnOn, fields).await?;
        Ok(CommandResult::new(resolved, "on"))
    }

    /// The percentage to send, or `None` when stepping a light that reports
    /// no brightness (it's off).
    async fn brightness_percent(&self, resolved: &Resolved, level: BrightnessLevel) -> Result<Option<u8>> {
        let step: fn(u8) -> u8 = match level {
            BrightnessLevel::Percent(percent) => return Ok(Some(percent)),
            BrightnessLevel::Up => convert::step_up,
            BrightnessLevel::Down => convert::step_down,
        };

        let entity_id = resolved.entity_id();
        let current = self
            .hub
            .states()
            .await?
            .iter()
            .find(|e| e.entity_id == entity_id)
            .and_then(|e| e.attribute("brightness"))
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.round() as u64)));

        let Some(raw) = current else {
            debug!("{} reports no brightness, not stepping", entity_id);
            return Ok(None);
        };
        let percent = convert::raw_to_percent(raw);
        debug!("{} is at {}% ({}), stepping {}", entity_id, percent, raw, level);
        Ok(Some(step(percent)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::testing::*;
    use super::*;
    use crate::error::ErrorKind;
    use crate::hub::MockTransport;

    fn light_controller() -> Controller<MockTransport> {
        controller(MockTransport::with_fixtures().with_response("/services/light/turn_on", OK))
    }

    fn token(s: &str) -> Target {
        Target::Token(s.to_string())
    }

    #[test]
    fn test_parse_brightness_level() {
        assert_eq!("+".parse::<BrightnessLevel>().unwrap(), BrightnessLevel::Up);
        assert_eq!("-".parse::<BrightnessLevel>().unwrap(), BrightnessLevel::Down);
        assert_eq!("min".parse::<BrightnessLevel>().unwrap(), BrightnessLevel::Percent(1));
        assert_eq!("mid".parse::<BrightnessLevel>().unwrap(), BrightnessLevel::Percent(50));
        assert_eq!("max".parse::<BrightnessLevel>().unwrap(), BrightnessLevel::Percent(99));
        assert_eq!("42".parse::<BrightnessLevel>().unwrap(), BrightnessLevel::Percent(42));
        assert!("0".parse::<BrightnessLevel>().is_err());
        assert!("100".parse::<BrightnessLevel>().is_err());
        assert!("bright".parse::<BrightnessLevel>().is_err());
    }

    #[tokio::test]
    async fn test_set_brightness_absolute() {
        let controller = light_controller();
        let result = controller
            .set_brightness(&token("bedroom_main"), BrightnessLevel::Percent(50))
            .await
            .unwrap();
        assert_eq!(result.state, "brightness set to 50%");
        assert_eq!(
            sent(&controller).1,
            json!({"entity_id": "light.bedroom_main", "brightness": 128})
        );
    }

    #[tokio::test]
    async fn test_set_brightness_step_up() {
        let controller = light_controller();
        let result = controller
            .set_brightness(&token("bedroom_main"), BrightnessLevel::Up)
            .await
            .unwrap();
        assert_eq!(result.state, "brightness set to 60%");
        assert_eq!(sent(&controller).1["brightness"], json!(153));
    }

    #[tokio::test]
    async fn test_set_brightness_step_down() {
        let controller = light_controller();
        controller
            .set_brightness(&token("bedroom_main"), BrightnessLevel::Down)
            .await
            .unwrap();
        assert_eq!(sent(&controller).1["brightness"], json!(102));
    }

    #[tokio::test]
    async fn test_set_brightness_step_up_at_max() {
        let controller = light_controller();
        let result = controller
            .set_brightness(&token("livingroom_other"), BrightnessLevel::Up)
            .await
            .unwrap();
        assert_eq!(result.state, "brightness set to 99%");
        assert_eq!(sent(&controller).1["brightness"], json!(252));
    }

    #[tokio::test]
    async fn test_set_brightness_step_on_off_light() {
        let controller = light_controller();
        let result = controller
            .set_brightness(&token("bedroom_other"), BrightnessLevel::Up)
            .await
            .unwrap();
        assert_eq!(result.state, "on");
        assert_eq!(sent(&controller).1, json!({"entity_id": "light.bedroom_other"}));
    }

    #[tokio::test]
    async fn test_set_brightness_out_of_range_sends_nothing() {
        for percent in [0, 100, 150] {
            let controller = light_controller();
            let err = controller
                .set_brightness(&token("bedroom_main"), BrightnessLevel::Percent(percent))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
            assert!(controller.hub().transport().requests().is_empty());
        }
    }

    #[tokio::test]
    async fn test_turn_on_custom_brightness_out_of_range() {
        let controller = light_controller();
        let options = LightOptions {
            brightness: Some(BrightnessLevel::Percent(0)),
            color: Some([255, 0, 0]),
            color_temp: None,
        };
        let err = controller
            .turn_on_custom(&token("bedroom_main"), &options)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(controller.hub().transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_turn_on_custom_color() {
        let controller = light_controller();
        let options = LightOptions {
            brightness: Some(BrightnessLevel::Percent(99)),
            color: Some([255, 0, 128]),
            color_temp: None,
        };
        let result = controller
            .turn_on_custom(&token("livingroom_other"), &options)
            .await
            .unwrap();
        assert_eq!(result.state, "on");
        assert_eq!(
            sent(&controller).1,
            json!({"entity_id": "light.livingroom_other", "brightness": 252, "rgb_color": [255, 0, 128]})
        );
    }

    #[tokio::test]
    async fn test_turn_on_custom_color_temp() {
        let controller = light_controller();
        let options = LightOptions {
            color_temp: Some(2000),
            ..Default::default()
        };
        controller
            .turn_on_custom(&token("light.bedroom_main"), &options)
            .await
            .unwrap();
        assert_eq!(
            sent(&controller).1,
            json!({"entity_id": "light.bedroom_main", "color_temp": 500})
        );
    }

    #[tokio::test]
    async fn test_turn_on_custom_color_conflict() {
        let controller = light_controller();
        let options = LightOptions {
            color: Some([1, 2, 3]),
            color_temp: Some(4000),
            ..Default::default()
        };
        let err = controller
            .turn_on_custom(&token("bedroom_main"), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ColorConflict));
        assert!(controller.hub().transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_turn_on_custom_color_temp_out_of_range() {
        let controller = light_controller();
        let options = LightOptions {
            color_temp: Some(10000),
            ..Default::default()
        };
        let err = controller
            .turn_on_custom(&token("bedroom_main"), &options)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(controller.hub().transport().requests().is_empty());
    }
}
