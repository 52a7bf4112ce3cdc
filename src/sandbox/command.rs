use std::fmt;

use crate::error::GradeError;

const MAX_NAME_LEN: usize = 128;
const MAX_PATH_LEN: usize = 1024;

/// An argument vector for one remote invocation
///
/// The executor passes the arguments through as-is; nothing here is ever
/// interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    args: Vec<String>,
}

impl CommandDescriptor {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

impl fmt::Display for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args.join(" "))
    }
}

/// Checks a single identifier such as an exam name, test name or file name
///
/// Only ASCII letters, digits, `.`, `_` and `-` are accepted, and the name may
/// not start with `.` or `-` so it can neither climb directories nor be read
/// as an option.
pub fn validate_name<'a>(kind: &str, value: &'a str) -> Result<&'a str, GradeError> {
    let well_formed = !value.is_empty()
        && value.len() <= MAX_NAME_LEN
        && !value.starts_with(['.', '-'])
        && value.chars().all(is_name_char);

    if well_formed {
        Ok(value)
    } else {
        log::warn!("Rejected {kind} {value:?}");
        Err(GradeError::bad_request(format!("invalid {kind}")))
    }
}

/// Checks a directory inside the sandbox, absolute or relative to its workdir
pub fn validate_dir<'a>(kind: &str, value: &'a str) -> Result<&'a str, GradeError> {
    let well_formed = !value.is_empty()
        && value.len() <= MAX_PATH_LEN
        && !value.starts_with('-')
        && value
            .split('/')
            .all(|seg| seg != ".." && seg.chars().all(is_name_char));

    if well_formed {
        Ok(value)
    } else {
        log::warn!("Rejected {kind} {value:?}");
        Err(GradeError::bad_request(format!("invalid {kind}")))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Joins path segments with a single `/`
pub fn join_path(base: &str, tail: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{tail}")
    } else {
        format!("{base}/{tail}")
    }
}

/// Number of leading directories `wget` must drop so the fetched tree lands
/// directly in the working directory
///
/// One per `/` in the host URL, minus the two of the scheme separator, plus
/// one for the item directory appended to the URL.
pub fn cut_dirs(resource_host: &str) -> usize {
    let slashes = resource_host.matches('/').count();
    let scheme = if resource_host.contains("://") { 2 } else { 0 };
    slashes.saturating_sub(scheme) + 1
}

/// `wget` invocation that mirrors `<host>/<item>/` into the working directory
pub fn recursive_fetch(resource_host: &str, item: &str) -> CommandDescriptor {
    CommandDescriptor::new([
        "wget".to_string(),
        "-r".to_string(),
        "-np".to_string(),
        "-R".to_string(),
        "index.html*".to_string(),
        "-nH".to_string(),
        format!("--cut-dirs={}", cut_dirs(resource_host)),
        format!("{resource_host}/{item}/"),
    ])
}

/// `git clone` of a resource repository into the working directory
pub fn clone_repository(url: &str) -> CommandDescriptor {
    CommandDescriptor::new(["git", "clone", url, "."])
}

/// Directory listing used to probe for a compiled artifact
pub fn list(path: &str) -> CommandDescriptor {
    CommandDescriptor::new(["ls", path])
}

/// Builder for `make` invocations scoped to one directory
#[derive(Debug, Clone)]
pub struct MakeCommand {
    dir: String,
    force: bool,
    target: Option<String>,
}

impl MakeCommand {
    pub fn new(dir: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            force: false,
            target: None,
        }
    }

    /// Rebuild everything regardless of timestamps (`-B`)
    pub fn force_rebuild(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn target(mut self, target: Option<&str>) -> Self {
        self.target = target.map(str::to_string);
        self
    }

    pub fn build(self) -> CommandDescriptor {
        let mut args = vec!["make".to_string()];
        if self.force {
            args.push("-B".to_string());
        }
        if let Some(target) = self.target {
            args.push(target);
            // -s would also hide the recipe lines, which the caller wants
            args.push("--no-print-directory".to_string());
        }
        args.push("-C".to_string());
        args.push(self.dir);
        CommandDescriptor::new(args)
    }
}
