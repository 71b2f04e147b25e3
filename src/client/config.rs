use std::time::Duration;

use url::Url;

use crate::foundation::error::{BrushError, BrushResult};

/// Default public deployment of the effect service.
pub const DEFAULT_BASE_URL: &str = "https://quantumbrush.fly.dev";

/// Environment variable overriding [`ClientConfig::base_url`].
pub const BASE_URL_ENV: &str = "QUANTUM_BRUSH_BASE_URL";

/// Environment variable overriding [`ClientConfig::timeout`], in whole seconds.
pub const TIMEOUT_ENV: &str = "QUANTUM_BRUSH_TIMEOUT_SECS";

const EFFECT_PLACEHOLDER: &str = "{effect}";

/// Where the effect service lives and how its routes are laid out.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: Url,
    pub effects_route: String,
    pub render_route: String,
    /// Contains `{effect}`, replaced by the effect name.
    pub stroke_route_template: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL"),
            effects_route: "/effects".to_string(),
            render_route: "/render".to_string(),
            stroke_route_template: "/render/{effect}/stroke".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    /// Defaults, overridden by `QUANTUM_BRUSH_BASE_URL` / `QUANTUM_BRUSH_TIMEOUT_SECS`.
    pub fn from_env() -> BrushResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> BrushResult<Self> {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(BASE_URL_ENV) {
            cfg.base_url = parse_base_url(&raw)?;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            cfg.timeout = parse_timeout_secs(&raw)?;
        }
        Ok(cfg)
    }

    pub fn effects_url(&self) -> BrushResult<Url> {
        self.route(&self.effects_route, &[])
    }

    pub fn render_url(&self, effect: &str) -> BrushResult<Url> {
        self.route(&self.render_route, &[effect])
    }

    pub fn stroke_url(&self, effect: &str) -> BrushResult<Url> {
        let (head, tail) = self
            .stroke_route_template
            .split_once(EFFECT_PLACEHOLDER)
            .ok_or_else(|| {
                BrushError::config(format!(
                    "stroke route '{}' has no {EFFECT_PLACEHOLDER} placeholder",
                    self.stroke_route_template
                ))
            })?;
        let mut url = self.route(head, &[effect])?;
        let tail_segments: Vec<&str> = tail.split('/').filter(|s| !s.is_empty()).collect();
        url.path_segments_mut()
            .map_err(|_| BrushError::config("base URL cannot carry a path"))?
            .extend(tail_segments);
        Ok(url)
    }

    /// Append `route` and then `extra` as individually escaped segments to the base URL.
    fn route(&self, route: &str, extra: &[&str]) -> BrushResult<Url> {
        if extra.iter().any(|s| s.is_empty()) {
            return Err(BrushError::validation("effect name must not be empty"));
        }
        let mut url = self.base_url.clone();
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| BrushError::config("base URL cannot carry a path"))?;
            segs.pop_if_empty();
            segs.extend(route.split('/').filter(|s| !s.is_empty()));
            segs.extend(extra);
        }
        Ok(url)
    }
}

pub(crate) fn parse_base_url(raw: &str) -> BrushResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| BrushError::config(format!("invalid base URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BrushError::config(format!(
            "base URL must be http(s), got '{}'",
            url.scheme()
        )));
    }
    Ok(url)
}

pub(crate) fn parse_timeout_secs(raw: &str) -> BrushResult<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|e| BrushError::config(format!("invalid timeout '{raw}': {e}")))?;
    if secs == 0 {
        return Err(BrushError::config("timeout must be > 0 seconds"));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[path = "../../tests/unit/client/config.rs"]
mod tests;
