use serde_json::json;
use serde_json::Map;

use super::CommandResult;
use super::Controller;
use crate::error::Error;
use crate::error::Result;
use crate::hub::Service;
use crate::hub::Transport;
use crate::resolve::Target;

impl<T: Transport> Controller<T> {
    pub async fn set_temperature(&self, target: &Target, temperature: f64) -> Result<CommandResult> {
        if !temperature.is_finite() {
            return Err(Error::invalid("temperature", format!("{temperature} is not a number")));
        }
        let resolved = self.prepare(target, Service::SetTemperature).await?;

        let mut fields = Map::new();
        fields.insert("temperature".to_string(), json!(temperature));
        self.call(&resolved, Service::SetTemperature, fields).await?;
        Ok(CommandResult::new(resolved, format!("temperature set to {temperature}")))
    }
}
