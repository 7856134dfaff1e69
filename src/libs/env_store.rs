// This module implements user scoped environment storage.
// Every stage that touches environment variables goes through `EnvironmentStore`,
// so tests can swap the real user environment for `MemoryEnvStore`. The
// persistent side is the Windows registry (`HKCU\Environment`) on Windows and a
// managed block in the user's shell profile everywhere else.

// Failures to persist or mirror a variable.
use crate::schemas::errors::EnvError;
// Ordered maps keep the in-memory store's contents stable in assertions.
use std::collections::BTreeMap;
// Process environment values are OS strings.
use std::ffi::OsString;

/// Name of the search path variable as stored at user scope.
#[cfg(windows)]
pub const PATH_VARIABLE: &str = "Path";
#[cfg(not(windows))]
pub const PATH_VARIABLE: &str = "PATH";

/// Separator between entries of a search path list.
#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: char = ':';

/// Read/write access to the persistent user environment plus the
/// environment of the running process.
pub trait EnvironmentStore {
    /// Value persisted at user scope, `None` when the variable is not set there.
    fn persisted(&self, name: &str) -> Result<Option<String>, EnvError>;

    /// Writes `value` at user scope so future processes see it.
    fn persist(&mut self, name: &str, value: &str) -> Result<(), EnvError>;

    /// Value in the current process environment.
    fn process(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    /// Sets `name` in the current process environment.
    fn mirror(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        validate_process_binding(name, value)?;
        // SAFETY: the tool is single threaded; nothing reads the environment concurrently.
        unsafe { std::env::set_var(name, value) };
        Ok(())
    }
}

/// `std::env::set_var` panics on these inputs, so they are rejected up front.
fn validate_process_binding(name: &str, value: &str) -> Result<(), EnvError> {
    if name.is_empty() || name.contains('=') || name.contains('\0') || value.contains('\0') {
        return Err(EnvError::MirrorFailure {
            name: name.to_string(),
            reason: "invalid variable name or value".to_string(),
        });
    }
    Ok(())
}

/// In-memory store with separate persisted and process maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryEnvStore {
    pub persisted: BTreeMap<String, String>,
    pub process: BTreeMap<String, String>,
    /// Number of successful `persist` calls, for idempotence assertions.
    pub persist_writes: usize,
}

impl MemoryEnvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the process `PATH`.
    pub fn with_process_path(mut self, path: impl Into<String>) -> Self {
        self.process.insert(PATH_VARIABLE.to_string(), path.into());
        self
    }
}

impl EnvironmentStore for MemoryEnvStore {
    fn persisted(&self, name: &str) -> Result<Option<String>, EnvError> {
        Ok(self.persisted.get(name).cloned())
    }

    fn persist(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        self.persisted.insert(name.to_string(), value.to_string());
        self.persist_writes += 1;
        Ok(())
    }

    fn process(&self, name: &str) -> Option<OsString> {
        self.process.get(name).map(OsString::from)
    }

    fn mirror(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        validate_process_binding(name, value)?;
        self.process.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// The real user environment for the current platform.
#[cfg(windows)]
pub type UserEnvStore = registry::RegistryEnvStore;
#[cfg(not(windows))]
pub type UserEnvStore = profile::ShellProfileStore;

/// Opens the real user environment for the current platform.
#[cfg(windows)]
pub fn user_env_store() -> UserEnvStore {
    registry::RegistryEnvStore
}

/// Opens the real user environment for the current platform.
#[cfg(not(windows))]
pub fn user_env_store() -> UserEnvStore {
    profile::ShellProfileStore::for_current_shell()
}

#[cfg(windows)]
pub mod registry {
    use super::{EnvError, EnvironmentStore, PATH_VARIABLE};
    use std::io;
    use winreg::RegKey;
    use winreg::RegValue;
    use winreg::enums::{HKEY_CURRENT_USER, KEY_READ, KEY_WRITE, REG_EXPAND_SZ};

    /// `HKCU\Environment`, the store Windows builds new user sessions from.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct RegistryEnvStore;

    fn open(name: &str, flags: u32) -> Result<RegKey, EnvError> {
        RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags("Environment", flags)
            .map_err(|e| EnvError::PersistFailure {
                name: name.to_string(),
                reason: format!("cannot open HKCU\\Environment: {e}"),
            })
    }

    impl EnvironmentStore for RegistryEnvStore {
        fn persisted(&self, name: &str) -> Result<Option<String>, EnvError> {
            match open(name, KEY_READ)?.get_value::<String, _>(name) {
                Ok(value) => Ok(Some(value)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(EnvError::PersistFailure {
                    name: name.to_string(),
                    reason: e.to_string(),
                }),
            }
        }

        fn persist(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
            let key = open(name, KEY_READ | KEY_WRITE)?;
            let result = if name.eq_ignore_ascii_case(PATH_VARIABLE) {
                // Path entries commonly reference %USERPROFILE%; keep them expandable.
                let bytes = value
                    .encode_utf16()
                    .chain(std::iter::once(0))
                    .flat_map(u16::to_le_bytes)
                    .collect();
                key.set_raw_value(
                    name,
                    &RegValue {
                        bytes,
                        vtype: REG_EXPAND_SZ,
                    },
                )
            } else {
                key.set_value(name, &value.to_string())
            };
            result.map_err(|e| EnvError::PersistFailure {
                name: name.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

#[cfg(not(windows))]
pub mod profile {
    use super::{EnvError, EnvironmentStore, PATH_LIST_SEPARATOR, PATH_VARIABLE};
    use crate::libs::utilities::file_operations::write_atomically;
    use crate::log_debug;
    use colored::Colorize;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    pub const BLOCK_BEGIN: &str = "# >>> setup-sccache environment (managed) >>>";
    pub const BLOCK_END: &str = "# <<< setup-sccache environment (managed) <<<";

    // Appended to the managed PATH export so the inherited PATH survives.
    const PATH_TAIL: &str = "$PATH";

    /// Persists variables as `export` lines inside a managed block of a shell
    /// profile. Everything outside the block is left untouched.
    ///
    /// The persisted `PATH` value is only the managed directory list; the
    /// written line is `export PATH="<list>:$PATH"`.
    #[derive(Debug, Clone)]
    pub struct ShellProfileStore {
        profile: PathBuf,
    }

    impl ShellProfileStore {
        pub fn new(profile: impl Into<PathBuf>) -> Self {
            Self {
                profile: profile.into(),
            }
        }

        /// `~/.zshrc` for zsh, `~/.bashrc` for bash, `~/.profile` otherwise.
        pub fn for_current_shell() -> Self {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
            let shell = std::env::var("SHELL").unwrap_or_default();
            let rc = match Path::new(&shell).file_name().and_then(|s| s.to_str()) {
                Some("zsh") => ".zshrc",
                Some("bash") => ".bashrc",
                _ => ".profile",
            };
            Self::new(home.join(rc))
        }

        fn read(&self, name: &str) -> Result<String, EnvError> {
            match fs::read_to_string(&self.profile) {
                Ok(contents) => Ok(contents),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
                Err(e) => Err(persist_failure(name, &self.profile, e)),
            }
        }
    }

    fn persist_failure(name: &str, profile: &Path, e: io::Error) -> EnvError {
        EnvError::PersistFailure {
            name: name.to_string(),
            reason: format!("{}: {e}", profile.display()),
        }
    }

    /// Managed `(name, value)` pairs in file order.
    pub fn parse_block(contents: &str) -> Vec<(String, String)> {
        let mut inside = false;
        let mut bindings = Vec::new();
        for line in contents.lines() {
            let trimmed = line.trim();
            if trimmed == BLOCK_BEGIN {
                inside = true;
            } else if trimmed == BLOCK_END {
                inside = false;
            } else if inside {
                if let Some((name, value)) = parse_export(trimmed) {
                    bindings.push((name, value));
                }
            }
        }
        bindings
    }

    fn parse_export(line: &str) -> Option<(String, String)> {
        let rest = line.strip_prefix("export ")?;
        let (name, raw) = rest.split_once('=')?;
        let raw = raw.trim();
        let quoted = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"'))?;
        let mut value = unescape(quoted);
        if name == PATH_VARIABLE {
            let tail = format!("{PATH_LIST_SEPARATOR}{PATH_TAIL}");
            if let Some(stripped) = quoted.strip_suffix(tail.as_str()) {
                value = unescape(stripped);
            } else if quoted == PATH_TAIL {
                value = String::new();
            }
        }
        Some((name.trim().to_string(), value))
    }

    fn escape(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            if matches!(c, '\\' | '"' | '$' | '`') {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }

    fn unescape(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut chars = value.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(&next) = chars.peek() {
                    if matches!(next, '\\' | '"' | '$' | '`') {
                        out.push(next);
                        chars.next();
                        continue;
                    }
                }
            }
            out.push(c);
        }
        out
    }

    fn render_export(name: &str, value: &str) -> String {
        if name == PATH_VARIABLE {
            format!("export {name}=\"{}{PATH_LIST_SEPARATOR}{PATH_TAIL}\"", escape(value))
        } else {
            format!("export {name}=\"{}\"", escape(value))
        }
    }

    /// Returns `contents` with the managed block rewritten to hold `bindings`.
    /// A missing block is appended at the end, separated by a blank line.
    pub fn render_with_block(contents: &str, bindings: &[(String, String)]) -> String {
        let mut block = vec![BLOCK_BEGIN.to_string()];
        block.extend(bindings.iter().map(|(n, v)| render_export(n, v)));
        block.push(BLOCK_END.to_string());

        let lines: Vec<&str> = contents.lines().collect();
        let begin = lines.iter().position(|l| l.trim() == BLOCK_BEGIN);
        let end = lines.iter().position(|l| l.trim() == BLOCK_END);

        let mut out: Vec<String> = Vec::with_capacity(lines.len() + block.len() + 1);
        match (begin, end) {
            (Some(b), Some(e)) if b < e => {
                out.extend(lines[..b].iter().map(|l| l.to_string()));
                out.extend(block);
                out.extend(lines[e + 1..].iter().map(|l| l.to_string()));
            }
            _ => {
                out.extend(lines.iter().map(|l| l.to_string()));
                if out.last().is_some_and(|l| !l.trim().is_empty()) {
                    out.push(String::new());
                }
                out.extend(block);
            }
        }
        format!("{}\n", out.join("\n"))
    }

    impl EnvironmentStore for ShellProfileStore {
        fn persisted(&self, name: &str) -> Result<Option<String>, EnvError> {
            let contents = self.read(name)?;
            Ok(parse_block(&contents)
                .into_iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v))
        }

        fn persist(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
            let contents = self.read(name)?;
            let mut bindings = parse_block(&contents);
            match bindings.iter_mut().find(|(n, _)| n == name) {
                Some(existing) => existing.1 = value.to_string(),
                None => bindings.push((name.to_string(), value.to_string())),
            }
            let updated = render_with_block(&contents, &bindings);

            write_atomically(&self.profile, &updated)
                .map_err(|e| persist_failure(name, &self.profile, e))?;

            log_debug!(
                "[Env] Persisted {} in {}",
                name.bold(),
                self.profile.display().to_string().cyan()
            );
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn persists_into_managed_block_and_reads_back() {
            let tmp = tempfile::tempdir().unwrap();
            let rc = tmp.path().join(".bashrc");
            fs::write(&rc, "alias ll='ls -l'\n").unwrap();
            let mut store = ShellProfileStore::new(&rc);

            store.persist("RUSTC_WRAPPER", "sccache").unwrap();
            store.persist("SCCACHE_DIR", "/home/u/.cache/sccache").unwrap();
            store.persist("RUSTC_WRAPPER", "sccache").unwrap();

            let contents = fs::read_to_string(&rc).unwrap();
            assert!(contents.starts_with("alias ll='ls -l'\n\n"));
            assert_eq!(contents.matches(BLOCK_BEGIN).count(), 1);
            assert_eq!(contents.matches("RUSTC_WRAPPER").count(), 1);
            assert_eq!(
                store.persisted("SCCACHE_DIR").unwrap().as_deref(),
                Some("/home/u/.cache/sccache")
            );
            assert_eq!(store.persisted("MISSING").unwrap(), None);
        }

        #[test]
        fn path_keeps_inherited_tail() {
            let tmp = tempfile::tempdir().unwrap();
            let rc = tmp.path().join(".zshrc");
            let mut store = ShellProfileStore::new(&rc);

            store.persist(PATH_VARIABLE, "/opt/a:/opt/b").unwrap();

            let contents = fs::read_to_string(&rc).unwrap();
            assert!(contents.contains("export PATH=\"/opt/a:/opt/b:$PATH\""));
            assert_eq!(
                store.persisted(PATH_VARIABLE).unwrap().as_deref(),
                Some("/opt/a:/opt/b")
            );
        }

        #[test]
        fn special_characters_round_trip() {
            let tmp = tempfile::tempdir().unwrap();
            let mut store = ShellProfileStore::new(tmp.path().join(".profile"));
            store.persist("ODD", "a\"b$c`d\\e").unwrap();
            assert_eq!(store.persisted("ODD").unwrap().as_deref(), Some("a\"b$c`d\\e"));
        }

        #[test]
        fn content_after_block_is_preserved() {
            let existing = format!("one\n{BLOCK_BEGIN}\nexport A=\"1\"\n{BLOCK_END}\ntwo\n");
            let rendered =
                render_with_block(&existing, &[("A".to_string(), "2".to_string())]);
            assert_eq!(
                rendered,
                format!("one\n{BLOCK_BEGIN}\nexport A=\"2\"\n{BLOCK_END}\ntwo\n")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_keeps_scopes_apart() {
        let mut store = MemoryEnvStore::new();
        store.persist("A", "1").unwrap();
        assert_eq!(store.persisted("A").unwrap().as_deref(), Some("1"));
        assert_eq!(store.process("A"), None);

        store.mirror("A", "1").unwrap();
        assert_eq!(store.process("A"), Some(OsString::from("1")));
        assert_eq!(store.persist_writes, 1);
    }

    /// Persists nowhere; exercises the default process-side methods.
    struct ProcessOnly;

    impl EnvironmentStore for ProcessOnly {
        fn persisted(&self, _name: &str) -> Result<Option<String>, EnvError> {
            Ok(None)
        }

        fn persist(&mut self, _name: &str, _value: &str) -> Result<(), EnvError> {
            Ok(())
        }
    }

    #[test]
    #[serial_test::serial]
    fn default_mirror_sets_the_process_environment() {
        let mut store = ProcessOnly;
        store.mirror("SETUP_SCCACHE_TEST_MIRROR", "on").unwrap();
        assert_eq!(
            store.process("SETUP_SCCACHE_TEST_MIRROR"),
            Some(OsString::from("on"))
        );
        // SAFETY: serialized with every other test touching the process environment.
        unsafe { std::env::remove_var("SETUP_SCCACHE_TEST_MIRROR") };
    }

    #[test]
    fn invalid_names_cannot_be_mirrored() {
        let mut store = MemoryEnvStore::new();
        assert!(matches!(
            store.mirror("A=B", "x"),
            Err(EnvError::MirrorFailure { .. })
        ));
        assert!(store.mirror("", "x").is_err());
    }
}
