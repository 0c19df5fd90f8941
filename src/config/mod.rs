//! Resolved server configuration.
//!
//! Flags and environment variables funnel into [`RawOptions`]; [`Config::resolve`]
//! validates them once and produces an immutable [`Config`] whose [`Mode`]
//! variant makes the invalid flag combinations unrepresentable afterwards.
//! Nothing downstream re-checks options at request time.

use std::path::PathBuf;

use thiserror::Error;

use crate::http::StatusCode;

/// Scheme prefix marking a response body that is read from a file per response.
const FILE_SCHEME: &str = "file://";

/// Configuration errors, all fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("response code must be an integer")]
    CodeNotInteger,

    #[error("response code {0} out of range; must be in 100..999 or 0 for default 200")]
    CodeOutOfRange(i64),

    #[error("-f and -b/-c/-t options are mutually exclusive")]
    ExclusiveModes,
}

/// Options exactly as the flag parser produced them, before validation.
///
/// Environment variables are layered on top with [`apply_env`](Self::apply_env);
/// a set environment variable wins over the corresponding flag.
#[derive(Debug, Clone)]
pub struct RawOptions {
    pub listen_addr: String,
    pub response_body: String,
    pub content_type: String,
    pub response_code: i64,
    pub fs_root: Option<PathBuf>,
}

impl Default for RawOptions {
    fn default() -> Self {
        Self {
            listen_addr: ":2000".to_owned(),
            response_body: String::new(),
            content_type: String::new(),
            response_code: 0,
            fs_root: None,
        }
    }
}

impl RawOptions {
    /// Overrides options from environment variables.
    ///
    /// Recognized names: `LISTEN_ADDR`, `RESPONSE_BODY`, `CONTENT_TYPE`,
    /// `RESPONSE_CODE`. Empty values are ignored. The variables are passed
    /// in rather than read from the ambient environment so tests can inject
    /// their own set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CodeNotInteger`] when `RESPONSE_CODE` is set
    /// but does not parse as an integer.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in vars {
            let value: String = value.into();
            if value.is_empty() {
                continue;
            }
            match name.as_ref() {
                "LISTEN_ADDR" => self.listen_addr = value,
                "RESPONSE_BODY" => self.response_body = value,
                "CONTENT_TYPE" => self.content_type = value,
                "RESPONSE_CODE" => {
                    self.response_code =
                        value.parse().map_err(|_| ConfigError::CodeNotInteger)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// What the fixed-response mode answers with.
///
/// `File` bodies are re-read on every response so external edits to the file
/// are observed live; nothing is cached at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Empty,
    Literal(Vec<u8>),
    File(PathBuf),
}

/// The statically configured response for fixed-response mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedResponse {
    pub body: ResponseBody,
    pub status: Option<StatusCode>,
    pub content_type: Option<String>,
}

/// The two mutually exclusive serving modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Answer every request with one configured status/body/content-type.
    Fixed(FixedResponse),
    /// Map request paths to files under a root directory.
    FileServer { root: PathBuf },
}

/// Immutable snapshot of the resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen_addr: String,
    pub mode: Mode,
}

impl Config {
    /// Validates raw options and builds the final configuration.
    ///
    /// Escape sequences `\t` and `\n` in the response body are expanded here,
    /// exactly once; request handling never re-processes the value. A body
    /// starting with `file://` becomes a [`ResponseBody::File`] reference.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::CodeOutOfRange`] — response code outside `100..=999`
    ///   (and not 0, which means "use the default").
    /// - [`ConfigError::ExclusiveModes`] — a file-server root combined with
    ///   any of the fixed-response options.
    pub fn resolve(raw: RawOptions) -> Result<Self, ConfigError> {
        let status = match raw.response_code {
            0 => None,
            code => {
                let code_u16 =
                    u16::try_from(code).map_err(|_| ConfigError::CodeOutOfRange(code))?;
                Some(StatusCode::from_u16(code_u16).ok_or(ConfigError::CodeOutOfRange(code))?)
            }
        };

        if let Some(root) = raw.fs_root {
            let fixed_options_present = !raw.response_body.is_empty()
                || status.is_some()
                || !raw.content_type.is_empty();
            if fixed_options_present {
                return Err(ConfigError::ExclusiveModes);
            }
            return Ok(Self {
                listen_addr: raw.listen_addr,
                mode: Mode::FileServer { root },
            });
        }

        let expanded = expand_escapes(&raw.response_body);
        let body = if expanded.is_empty() {
            ResponseBody::Empty
        } else if let Some(path) = expanded.strip_prefix(FILE_SCHEME) {
            ResponseBody::File(PathBuf::from(path))
        } else {
            ResponseBody::Literal(expanded.into_bytes())
        };

        let content_type = (!raw.content_type.is_empty()).then_some(raw.content_type);

        Ok(Self {
            listen_addr: raw.listen_addr,
            mode: Mode::Fixed(FixedResponse {
                body,
                status,
                content_type,
            }),
        })
    }
}

/// Expands the two supported escape sequences in a configured body value.
fn expand_escapes(value: &str) -> String {
    value.replace("\\t", "\t").replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_empty_fixed_mode() {
        let config = Config::resolve(RawOptions::default()).unwrap();
        assert_eq!(config.listen_addr, ":2000");
        assert_eq!(
            config.mode,
            Mode::Fixed(FixedResponse {
                body: ResponseBody::Empty,
                status: None,
                content_type: None,
            })
        );
    }

    #[test]
    fn escapes_expand_once_at_resolution() {
        let raw = RawOptions {
            response_body: r"a\tb\nc".to_owned(),
            ..RawOptions::default()
        };
        let config = Config::resolve(raw).unwrap();
        let Mode::Fixed(fixed) = config.mode else {
            panic!("expected fixed mode");
        };
        assert_eq!(fixed.body, ResponseBody::Literal(b"a\tb\nc".to_vec()));
    }

    #[test]
    fn file_scheme_becomes_file_reference() {
        let raw = RawOptions {
            response_body: "file:///tmp/x.txt".to_owned(),
            ..RawOptions::default()
        };
        let config = Config::resolve(raw).unwrap();
        let Mode::Fixed(fixed) = config.mode else {
            panic!("expected fixed mode");
        };
        assert_eq!(fixed.body, ResponseBody::File(PathBuf::from("/tmp/x.txt")));
    }

    #[test]
    fn code_zero_means_default() {
        let config = Config::resolve(RawOptions::default()).unwrap();
        let Mode::Fixed(fixed) = config.mode else {
            panic!("expected fixed mode");
        };
        assert_eq!(fixed.status, None);
    }

    #[test]
    fn code_range_is_enforced() {
        for bad in [-1, 1, 99, 1000, 70000] {
            let raw = RawOptions {
                response_code: bad,
                ..RawOptions::default()
            };
            assert_eq!(
                Config::resolve(raw).unwrap_err(),
                ConfigError::CodeOutOfRange(bad)
            );
        }

        let raw = RawOptions {
            response_code: 404,
            ..RawOptions::default()
        };
        let config = Config::resolve(raw).unwrap();
        let Mode::Fixed(fixed) = config.mode else {
            panic!("expected fixed mode");
        };
        assert_eq!(fixed.status.unwrap().as_u16(), 404);
    }

    #[test]
    fn file_server_conflicts_with_fixed_options() {
        for raw in [
            RawOptions {
                fs_root: Some(PathBuf::from("./static")),
                response_code: 404,
                ..RawOptions::default()
            },
            RawOptions {
                fs_root: Some(PathBuf::from("./static")),
                response_body: "hi".to_owned(),
                ..RawOptions::default()
            },
            RawOptions {
                fs_root: Some(PathBuf::from("./static")),
                content_type: "text/html".to_owned(),
                ..RawOptions::default()
            },
        ] {
            assert_eq!(Config::resolve(raw).unwrap_err(), ConfigError::ExclusiveModes);
        }
    }

    #[test]
    fn file_server_alone_is_valid() {
        let raw = RawOptions {
            fs_root: Some(PathBuf::from("./static")),
            ..RawOptions::default()
        };
        let config = Config::resolve(raw).unwrap();
        assert_eq!(
            config.mode,
            Mode::FileServer {
                root: PathBuf::from("./static")
            }
        );
    }

    #[test]
    fn env_overrides_flags() {
        let mut raw = RawOptions {
            listen_addr: ":9000".to_owned(),
            response_body: "from-flag".to_owned(),
            ..RawOptions::default()
        };
        raw.apply_env([
            ("LISTEN_ADDR", ":2000"),
            ("RESPONSE_BODY", "from-env"),
            ("RESPONSE_CODE", "503"),
            ("UNRELATED", "ignored"),
        ])
        .unwrap();
        assert_eq!(raw.listen_addr, ":2000");
        assert_eq!(raw.response_body, "from-env");
        assert_eq!(raw.response_code, 503);
    }

    #[test]
    fn empty_env_values_do_not_override() {
        let mut raw = RawOptions {
            listen_addr: ":9000".to_owned(),
            ..RawOptions::default()
        };
        raw.apply_env([("LISTEN_ADDR", "")]).unwrap();
        assert_eq!(raw.listen_addr, ":9000");
    }

    #[test]
    fn non_integer_env_code_is_fatal() {
        let mut raw = RawOptions::default();
        assert_eq!(
            raw.apply_env([("RESPONSE_CODE", "abc")]).unwrap_err(),
            ConfigError::CodeNotInteger
        );
    }
}
