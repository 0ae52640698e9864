//! `RUN --mount` specifications.
//!
//! Each mount flavor carries only the options that apply to it. Values
//! that are not given keep the BuildKit defaults, so a renderer can tell
//! explicit settings apart by comparing against [`Default`].

use typeconvert_core::error::{ConvertError, Result};

/// Default permission bits of a cache mount.
pub const CACHE_DEFAULT_MODE: u32 = 0o755;
/// Default permission bits of a secret mount.
pub const SECRET_DEFAULT_MODE: u32 = 0o400;
/// Default permission bits of an SSH agent socket mount.
pub const SSH_DEFAULT_MODE: u32 = 0o600;
/// Default SSH agent id.
pub const SSH_DEFAULT_ID: &str = "default";

/// Mount flavor, ordered for deterministic import generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MountKind {
    Bind,
    Cache,
    Tmpfs,
    Secret,
    Ssh,
}

impl MountKind {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "bind" => Ok(MountKind::Bind),
            "cache" => Ok(MountKind::Cache),
            "tmpfs" => Ok(MountKind::Tmpfs),
            "secret" => Ok(MountKind::Secret),
            "ssh" => Ok(MountKind::Ssh),
            other => Err(ConvertError::Expansion(format!(
                "unsupported mount type '{}'",
                other
            ))),
        }
    }
}

/// Cache sharing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheSharing {
    #[default]
    Shared,
    Private,
    Locked,
}

impl CacheSharing {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheSharing::Shared => "shared",
            CacheSharing::Private => "private",
            CacheSharing::Locked => "locked",
        }
    }
}

/// `type=bind`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub target: String,
    pub source: Option<String>,
    pub from: Option<String>,
    pub read_only: bool,
}

impl Default for BindMount {
    fn default() -> Self {
        Self {
            target: String::new(),
            source: None,
            from: None,
            read_only: true,
        }
    }
}

/// `type=cache`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMount {
    pub id: Option<String>,
    pub target: String,
    pub source: Option<String>,
    pub from: Option<String>,
    pub read_only: bool,
    pub sharing: CacheSharing,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

impl Default for CacheMount {
    fn default() -> Self {
        Self {
            id: None,
            target: String::new(),
            source: None,
            from: None,
            read_only: false,
            sharing: CacheSharing::Shared,
            mode: CACHE_DEFAULT_MODE,
            uid: 0,
            gid: 0,
        }
    }
}

/// `type=tmpfs`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TmpfsMount {
    pub target: String,
    /// Size limit in bytes, 0 for unlimited
    pub size: u64,
}

/// `type=secret`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretMount {
    pub id: Option<String>,
    pub target: Option<String>,
    pub required: bool,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

impl Default for SecretMount {
    fn default() -> Self {
        Self {
            id: None,
            target: None,
            required: false,
            mode: SECRET_DEFAULT_MODE,
            uid: 0,
            gid: 0,
        }
    }
}

/// `type=ssh`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshMount {
    pub id: String,
    pub target: Option<String>,
    pub required: bool,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

impl Default for SshMount {
    fn default() -> Self {
        Self {
            id: SSH_DEFAULT_ID.to_string(),
            target: None,
            required: false,
            mode: SSH_DEFAULT_MODE,
            uid: 0,
            gid: 0,
        }
    }
}

/// A parsed `--mount` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mount {
    Bind(BindMount),
    Cache(CacheMount),
    Tmpfs(TmpfsMount),
    Secret(SecretMount),
    Ssh(SshMount),
}

impl Mount {
    pub fn kind(&self) -> MountKind {
        match self {
            Mount::Bind(_) => MountKind::Bind,
            Mount::Cache(_) => MountKind::Cache,
            Mount::Tmpfs(_) => MountKind::Tmpfs,
            Mount::Secret(_) => MountKind::Secret,
            Mount::Ssh(_) => MountKind::Ssh,
        }
    }

    /// Stage or image the mount reads from, if any.
    pub fn from(&self) -> Option<&str> {
        match self {
            Mount::Bind(m) => m.from.as_deref(),
            Mount::Cache(m) => m.from.as_deref(),
            _ => None,
        }
    }
}

/// Parse a `--mount` value such as `type=cache,target=/root/.cache,sharing=locked`.
pub fn parse_mount(spec: &str) -> Result<Mount> {
    let fields = spec
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| match f.split_once('=') {
            Some((k, v)) => (k.to_ascii_lowercase(), Some(v)),
            None => (f.to_ascii_lowercase(), None),
        })
        .collect::<Vec<_>>();

    let kind = match fields.iter().find(|(k, _)| k == "type") {
        Some((_, Some(value))) => MountKind::parse(value)?,
        Some((_, None)) => return Err(invalid(spec, "type requires a value")),
        None => MountKind::Bind,
    };

    let mut mount = match kind {
        MountKind::Bind => Mount::Bind(BindMount::default()),
        MountKind::Cache => Mount::Cache(CacheMount::default()),
        MountKind::Tmpfs => Mount::Tmpfs(TmpfsMount::default()),
        MountKind::Secret => Mount::Secret(SecretMount::default()),
        MountKind::Ssh => Mount::Ssh(SshMount::default()),
    };

    for (key, value) in &fields {
        if key == "type" {
            continue;
        }
        apply_field(&mut mount, key, *value, spec)?;
    }

    let missing_target = match &mount {
        Mount::Bind(m) => m.target.is_empty(),
        Mount::Cache(m) => m.target.is_empty(),
        Mount::Tmpfs(m) => m.target.is_empty(),
        Mount::Secret(_) | Mount::Ssh(_) => false,
    };
    if missing_target {
        return Err(invalid(spec, "mount requires a target"));
    }

    Ok(mount)
}

fn apply_field(mount: &mut Mount, key: &str, value: Option<&str>, spec: &str) -> Result<()> {
    let text = || {
        value
            .map(str::to_string)
            .ok_or_else(|| invalid(spec, &format!("'{}' requires a value", key)))
    };

    match (mount, key) {
        (Mount::Bind(m), "target" | "dst" | "destination") => m.target = text()?,
        (Mount::Bind(m), "source" | "src") => m.source = Some(text()?),
        (Mount::Bind(m), "from") => m.from = Some(text()?),
        (Mount::Bind(m), "ro" | "readonly") => m.read_only = parse_bool(value, spec)?,
        (Mount::Bind(m), "rw" | "readwrite") => m.read_only = !parse_bool(value, spec)?,

        (Mount::Cache(m), "id") => m.id = Some(text()?),
        (Mount::Cache(m), "target" | "dst" | "destination") => m.target = text()?,
        (Mount::Cache(m), "source" | "src") => m.source = Some(text()?),
        (Mount::Cache(m), "from") => m.from = Some(text()?),
        (Mount::Cache(m), "ro" | "readonly") => m.read_only = parse_bool(value, spec)?,
        (Mount::Cache(m), "rw" | "readwrite") => m.read_only = !parse_bool(value, spec)?,
        (Mount::Cache(m), "sharing") => {
            m.sharing = match text()?.as_str() {
                "shared" => CacheSharing::Shared,
                "private" => CacheSharing::Private,
                "locked" => CacheSharing::Locked,
                other => return Err(invalid(spec, &format!("unknown sharing '{}'", other))),
            }
        }
        (Mount::Cache(m), "mode") => m.mode = parse_mode(value, spec)?,
        (Mount::Cache(m), "uid") => m.uid = parse_number(value, spec)?,
        (Mount::Cache(m), "gid") => m.gid = parse_number(value, spec)?,

        (Mount::Tmpfs(m), "target" | "dst" | "destination") => m.target = text()?,
        (Mount::Tmpfs(m), "size") => m.size = parse_size(value, spec)?,

        (Mount::Secret(m), "id") => m.id = Some(text()?),
        (Mount::Secret(m), "target" | "dst" | "destination") => m.target = Some(text()?),
        (Mount::Secret(m), "required") => m.required = parse_bool(value, spec)?,
        (Mount::Secret(m), "mode") => m.mode = parse_mode(value, spec)?,
        (Mount::Secret(m), "uid") => m.uid = parse_number(value, spec)?,
        (Mount::Secret(m), "gid") => m.gid = parse_number(value, spec)?,

        (Mount::Ssh(m), "id") => m.id = text()?,
        (Mount::Ssh(m), "target" | "dst" | "destination") => m.target = Some(text()?),
        (Mount::Ssh(m), "required") => m.required = parse_bool(value, spec)?,
        (Mount::Ssh(m), "mode") => m.mode = parse_mode(value, spec)?,
        (Mount::Ssh(m), "uid") => m.uid = parse_number(value, spec)?,
        (Mount::Ssh(m), "gid") => m.gid = parse_number(value, spec)?,

        (_, key) => return Err(invalid(spec, &format!("unexpected key '{}'", key))),
    }
    Ok(())
}

fn invalid(spec: &str, reason: &str) -> ConvertError {
    ConvertError::Expansion(format!("invalid mount '{}': {}", spec, reason))
}

/// A bare flag (`ro`) means true.
fn parse_bool(value: Option<&str>, spec: &str) -> Result<bool> {
    match value.map(str::to_ascii_lowercase).as_deref() {
        None | Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(invalid(spec, &format!("invalid boolean '{}'", other))),
    }
}

fn parse_mode(value: Option<&str>, spec: &str) -> Result<u32> {
    let value = value.ok_or_else(|| invalid(spec, "'mode' requires a value"))?;
    let digits = value.trim_start_matches("0o");
    u32::from_str_radix(digits, 8)
        .map_err(|_| invalid(spec, &format!("invalid mode '{}'", value)))
}

fn parse_number<T: std::str::FromStr>(value: Option<&str>, spec: &str) -> Result<T> {
    let value = value.ok_or_else(|| invalid(spec, "numeric option requires a value"))?;
    value
        .parse()
        .map_err(|_| invalid(spec, &format!("invalid number '{}'", value)))
}

/// Parse a RAM size such as `1048576`, `64m`, `1.5G` or `512MiB`.
///
/// Suffixes are binary multiples (`k` = 1024) and case-insensitive.
fn parse_size(value: Option<&str>, spec: &str) -> Result<u64> {
    let value = value.ok_or_else(|| invalid(spec, "'size' requires a value"))?;
    let bad = || invalid(spec, &format!("invalid size '{}'", value));

    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f64 = number.parse().map_err(|_| bad())?;

    let unit = unit.to_ascii_lowercase();
    let prefix = unit
        .strip_suffix("ib")
        .or_else(|| unit.strip_suffix('b'))
        .unwrap_or(unit.as_str());
    let multiplier: u64 = match prefix {
        "" => 1,
        "k" => 1 << 10,
        "m" => 1 << 20,
        "g" => 1 << 30,
        "t" => 1 << 40,
        "p" => 1 << 50,
        _ => return Err(bad()),
    };
    if unit.ends_with("ib") && prefix.is_empty() {
        return Err(bad());
    }

    Ok((number * multiplier as f64) as u64)
}
