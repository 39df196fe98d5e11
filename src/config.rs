use crate::models::object::AccessPolicy;
use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use std::{env, fmt::Display, str::FromStr};

const DEFAULT_BUCKET: &str = "books-uploaded";
const DEFAULT_PORT: u16 = 5003;
const DEFAULT_LIST_LIMIT: usize = 1000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Which storage backend the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Amazon S3 or an S3-compatible service.
    S3,
    /// Process-local map; contents vanish on exit.
    Memory,
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub public_base_url: Option<String>,
    pub backend: BackendKind,
    pub acl: AccessPolicy,
    pub list_limit: usize,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Upload gateway in front of S3 object storage")]
pub struct Args {
    /// Host to bind to (overrides OBJECT_GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides OBJECT_GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bucket holding all uploaded objects (overrides OBJECT_GATEWAY_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// AWS region (overrides OBJECT_GATEWAY_REGION, then the AWS provider chain)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint (overrides OBJECT_GATEWAY_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Public URL root for stored objects (overrides OBJECT_GATEWAY_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Storage backend (overrides OBJECT_GATEWAY_BACKEND)
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Canned ACL applied to uploads (overrides OBJECT_GATEWAY_ACL)
    #[arg(long, value_enum)]
    pub acl: Option<AccessPolicy>,

    /// Maximum number of keys returned by one library listing (overrides OBJECT_GATEWAY_LIST_LIMIT)
    #[arg(long)]
    pub list_limit: Option<usize>,

    /// Maximum accepted request body in bytes (overrides OBJECT_GATEWAY_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge CLI args over values from `lookup`, falling back to defaults.
    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_host = lookup("OBJECT_GATEWAY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = parse_var(&lookup, "OBJECT_GATEWAY_PORT", DEFAULT_PORT)?;
        let env_bucket = lookup("OBJECT_GATEWAY_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.into());
        let env_backend = enum_var(&lookup, "OBJECT_GATEWAY_BACKEND", BackendKind::S3)?;
        let env_acl = enum_var(&lookup, "OBJECT_GATEWAY_ACL", AccessPolicy::PublicRead)?;
        let env_list_limit = parse_var(&lookup, "OBJECT_GATEWAY_LIST_LIMIT", DEFAULT_LIST_LIMIT)?;
        let env_max_upload = parse_var(
            &lookup,
            "OBJECT_GATEWAY_MAX_UPLOAD_BYTES",
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;

        let bucket = args.bucket.unwrap_or(env_bucket);
        if bucket.is_empty() {
            anyhow::bail!("bucket name must not be empty");
        }

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            bucket,
            region: args.region.or_else(|| lookup("OBJECT_GATEWAY_REGION")),
            endpoint_url: args
                .endpoint_url
                .or_else(|| lookup("OBJECT_GATEWAY_ENDPOINT_URL")),
            public_base_url: args
                .public_base_url
                .or_else(|| lookup("OBJECT_GATEWAY_PUBLIC_BASE_URL")),
            backend: args.backend.unwrap_or(env_backend),
            acl: args.acl.unwrap_or(env_acl),
            list_limit: args.list_limit.unwrap_or(env_list_limit).max(1),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        None => Ok(default),
    }
}

fn enum_var<T: ValueEnum>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T> {
    match lookup(name) {
        Some(value) => {
            <T as ValueEnum>::from_str(&value, true).map_err(|err| invalid(name, &value, err))
        }
        None => Ok(default),
    }
}

fn invalid(name: &str, value: &str, err: impl Display) -> anyhow::Error {
    anyhow!("parsing {} value `{}`: {}", name, value, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_without_env_or_args() {
        let cfg = AppConfig::resolve(Args::default(), env_of(&[])).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:5003");
        assert_eq!(cfg.bucket, "books-uploaded");
        assert_eq!(cfg.backend, BackendKind::S3);
        assert_eq!(cfg.acl, AccessPolicy::PublicRead);
        assert_eq!(cfg.list_limit, 1000);
        assert!(cfg.region.is_none());
        assert!(cfg.public_base_url.is_none());
    }

    #[test]
    fn env_overrides_defaults() {
        let cfg = AppConfig::resolve(
            Args::default(),
            env_of(&[
                ("OBJECT_GATEWAY_PORT", "8080"),
                ("OBJECT_GATEWAY_BUCKET", "shelf"),
                ("OBJECT_GATEWAY_BACKEND", "memory"),
                ("OBJECT_GATEWAY_ACL", "private"),
                ("OBJECT_GATEWAY_REGION", "eu-west-1"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.bucket, "shelf");
        assert_eq!(cfg.backend, BackendKind::Memory);
        assert_eq!(cfg.acl, AccessPolicy::Private);
        assert_eq!(cfg.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn args_override_env() {
        let args = Args::parse_from(["object-gateway", "--port", "9000", "--backend", "s3"]);
        let cfg = AppConfig::resolve(
            args,
            env_of(&[
                ("OBJECT_GATEWAY_PORT", "8080"),
                ("OBJECT_GATEWAY_BACKEND", "memory"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.backend, BackendKind::S3);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let bad_port = AppConfig::resolve(
            Args::default(),
            env_of(&[("OBJECT_GATEWAY_PORT", "not-a-port")]),
        );
        assert!(bad_port.is_err());

        let bad_backend = AppConfig::resolve(
            Args::default(),
            env_of(&[("OBJECT_GATEWAY_BACKEND", "floppy")]),
        );
        assert!(bad_backend.is_err());
    }

    #[test]
    fn list_limit_is_at_least_one() {
        let cfg = AppConfig::resolve(
            Args::default(),
            env_of(&[("OBJECT_GATEWAY_LIST_LIMIT", "0")]),
        )
        .unwrap();
        assert_eq!(cfg.list_limit, 1);
    }
}
