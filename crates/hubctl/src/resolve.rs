//! Turning what the user typed into a concrete `domain.name`.
//!
//! A token is matched against the entities whose domain offers the service
//! about to be called. An exact name wins outright; otherwise, if fuzzy
//! matching is enabled, the closest candidate by edit distance among those
//! containing the token as a subsequence is chosen.

use std::collections::BTreeMap;
use std::fmt;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use tracing::debug;
use tracing::info;

use crate::error::Error;
use crate::error::Result;
use crate::hub::split_entity_id;
use crate::hub::Capabilities;
use crate::hub::HubClient;
use crate::hub::Service;
use crate::hub::Transport;

/// What a command was asked to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `name` or `domain.name`, resolved against the hub.
    Token(String),
    /// Domain and name given separately; taken as-is.
    Explicit { domain: String, name: String },
}

impl Target {
    /// Build a target from the CLI's `<entity> [name]` arguments.
    ///
    /// A dotted `entity` already names its domain, so `name` is ignored.
    pub fn from_args(entity: &str, name: Option<&str>) -> Self {
        match name {
            Some(name) if !entity.contains('.') => Target::Explicit {
                domain: entity.to_string(),
                name: name.to_string(),
            },
            _ => Target::Token(entity.to_string()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Token(token) => write!(f, "{token}"),
            Target::Explicit { domain, name } => write!(f, "{domain}.{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub domain: String,
    pub name: String,
}

impl Resolved {
    pub fn entity_id(&self) -> String {
        format!("{}.{}", self.domain, self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    aliases: BTreeMap<String, String>,
    fuzzy: bool,
}

impl Resolver {
    pub fn new(aliases: BTreeMap<String, String>, fuzzy: bool) -> Self {
        Self { aliases, fuzzy }
    }

    pub fn from_config(config: &hubctl_config::Config) -> Self {
        Self::new(config.device_map.clone(), config.handling.fuzz)
    }

    /// Resolve `target` to an entity whose domain offers `service`.
    ///
    /// Explicit targets are returned without contacting the hub.
    pub async fn resolve<T: Transport>(
        &self,
        hub: &HubClient<T>,
        target: &Target,
        service: Service,
    ) -> Result<Resolved> {
        let caps = match target {
            Target::Token(_) => hub.capabilities().await?,
            Target::Explicit { .. } => Capabilities::new(&[], &[]),
        };
        self.resolve_in(caps, target, service)
    }

    /// Resolve `target` against listings that are already at hand.
    pub(crate) fn resolve_in(
        &self,
        caps: Capabilities<'_>,
        target: &Target,
        service: Service,
    ) -> Result<Resolved> {
        match target {
            Target::Explicit { domain, name } => Ok(Resolved {
                domain: domain.clone(),
                name: name.clone(),
            }),
            Target::Token(token) => self.resolve_token(caps, token, service),
        }
    }

    fn resolve_token(&self, caps: Capabilities<'_>, token: &str, service: Service) -> Result<Resolved> {
        let (mut hint, mut name) = split_entity_id(token);
        let mut fuzzy = self.fuzzy;

        if hint.is_empty() {
            if let Some(alias) = self.aliases.get(name) {
                info!("Using device alias {} -> {}", name, alias);
                (hint, name) = split_entity_id(alias);
                fuzzy = false;
            }
        }

        let mut candidates = Vec::new();
        for entity in caps.entities_with_service(service) {
            if !hint.is_empty() && entity.domain() != hint {
                continue;
            }
            if entity.name() == name {
                debug!("Exact match for {}: {}", token, entity.entity_id);
                return Ok(Resolved {
                    domain: entity.domain().to_string(),
                    name: entity.name().to_string(),
                });
            }
            candidates.push((entity.domain(), entity.name()));
        }

        if fuzzy {
            if let Some((domain, found)) = closest_match(name, &candidates) {
                info!("Fuzzy matched {} to {}.{}", token, domain, found);
                return Ok(Resolved {
                    domain: domain.to_string(),
                    name: found.to_string(),
                });
            }
        }

        Err(Error::NotFound {
            token: token.to_string(),
            service,
        })
    }
}

/// Among candidates that contain `target` as a subsequence, the one with the
/// lowest edit distance. The earlier candidate wins a tie.
fn closest_match<'a>(target: &str, candidates: &[(&'a str, &'a str)]) -> Option<(&'a str, &'a str)> {
    let matcher = SkimMatcherV2::default().respect_case();
    let mut best: Option<(usize, (&'a str, &'a str))> = None;

    for &(domain, name) in candidates {
        if matcher.fuzzy_match(name, target).is_none() {
            continue;
        }
        let distance = levenshtein(target, name);
        debug!("Fuzzy candidate {}.{} at distance {}", domain, name, distance);
        if best.map_or(true, |(lowest, _)| distance < lowest) {
            best = Some((distance, (domain, name)));
        }
    }

    best.map(|(_, found)| found)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();

    let mut prev_row: Vec<usize> = (0..=n).collect();
    let mut curr_row = vec![0usize; n + 1];

    for (i, a_ch) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_ch) in b_chars.iter().enumerate() {
            let cost = usize::from(a_ch != b_ch);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[n]
}
