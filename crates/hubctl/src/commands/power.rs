use serde_json::Map;

use super::CommandResult;
use super::Controller;
use crate::error::Result;
use crate::hub::Service;
use crate::hub::Transport;
use crate::resolve::Target;

impl<T: Transport> Controller<T> {
    pub async fn turn_on(&self, target: &Target) -> Result<CommandResult> {
        self.switch(target, Service::TurnOn, "on").await
    }

    pub async fn turn_off(&self, target: &Target) -> Result<CommandResult> {
        self.switch(target, Service::TurnOff, "off").await
    }

    pub async fn toggle(&self, target: &Target) -> Result<CommandResult> {
        self.switch(target, Service::Toggle, "toggle").await
    }

    async fn switch(&self, target: &Target, service: Service, state: &str) -> Result<CommandResult> {
        let resolved = self.prepare(target, service).await?;
        self.call(&resolved, service, Map::new()).await?;
        Ok(CommandResult::new(resolved, state))
    }
}
