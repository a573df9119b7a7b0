use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub environment: Environment,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: var("API_PORT")
                .or_else(|()| var("PORT"))
                .unwrap_or_else(|()| {
                    info!("API_PORT not set, using default: 3001");
                    "3001".to_string()
                })
                .parse()
                .map_err(|e| {
                    warn!("Invalid API_PORT value: {e}");
                })
                .expect("Environment misconfigured!"),
            data_dir: PathBuf::from(var("DATA_DIR").unwrap_or_else(|_| "public/data".to_string())),
            environment: try_load("APP_ENV", "production"),
        }
    }

    /// Whether error responses should carry the underlying error detail.
    pub fn verbose_errors(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_aliases() {
        assert_eq!(
            "development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!("staging".parse::<Environment>().is_err());
    }
}
