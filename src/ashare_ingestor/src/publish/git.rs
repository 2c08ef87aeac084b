use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Output,
    time::Duration,
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{
    config::PublishSettings,
    publish::{PublishError, Publisher},
};

/// Commits a file in an existing checkout and pushes it to the default remote.
pub struct GitPublisher {
    workdir: PathBuf,
    identity: Option<(String, String)>,
    timeout: Duration,
}

impl GitPublisher {
    /// `workdir` must lie inside a git checkout with an upstream configured.
    pub fn new(workdir: impl Into<PathBuf>, settings: &PublishSettings) -> Self {
        let identity = settings
            .user_name
            .clone()
            .zip(settings.user_email.clone());
        Self {
            workdir: workdir.into(),
            identity,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    async fn run<I, S>(&self, args: I) -> Result<(String, Output), PublishError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let step = std::iter::once("git".to_string())
            .chain(args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ");

        let mut cmd = Command::new("git");
        cmd.args(&args).current_dir(&self.workdir).kill_on_drop(true);
        debug!(%step, "running");

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok((step, output)),
            Ok(Err(source)) => Err(PublishError::Spawn { step, source }),
            Err(_) => Err(PublishError::Timeout {
                step,
                secs: self.timeout.as_secs(),
            }),
        }
    }

    async fn git<I, S>(&self, args: I) -> Result<(), PublishError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (step, output) = self.run(args).await?;
        if !output.status.success() {
            return Err(failed(step, &output));
        }
        Ok(())
    }

    /// Whether the index differs from `HEAD` for `pathspec`.
    async fn has_staged_changes(&self, pathspec: &Path) -> Result<bool, PublishError> {
        let (step, output) = self
            .run([
                OsStr::new("diff"),
                OsStr::new("--cached"),
                OsStr::new("--quiet"),
                OsStr::new("--"),
                pathspec.as_os_str(),
            ])
            .await?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(failed(step, &output)),
        }
    }
}

fn failed(step: String, output: &Output) -> PublishError {
    PublishError::Failed {
        step,
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

/// Rewrites `path` so git, running inside `workdir`, finds the same file.
///
/// Relative paths on both sides are taken against the process working
/// directory. A path outside `workdir` is passed on in absolute form.
pub fn pathspec_for(workdir: &Path, path: &Path) -> PathBuf {
    let (Ok(workdir), Ok(path)) = (std::path::absolute(workdir), std::path::absolute(path)) else {
        return path.to_path_buf();
    };
    match path.strip_prefix(&workdir) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => path,
    }
}

#[async_trait]
impl Publisher for GitPublisher {
    async fn publish(&self, path: &Path, label: &str) -> Result<(), PublishError> {
        if let Some((name, email)) = &self.identity {
            self.git(["config", "user.name", name.as_str()]).await?;
            self.git(["config", "user.email", email.as_str()]).await?;
        }

        let pathspec = pathspec_for(&self.workdir, path);
        self.git([OsStr::new("add"), OsStr::new("--"), pathspec.as_os_str()]).await?;

        // Nothing is staged when the history is unchanged. The push still runs
        // for commits an earlier run could not push.
        if self.has_staged_changes(&pathspec).await? {
            self.git(["commit", "-m", label]).await?;
        } else {
            info!(path = %path.display(), "history unchanged, nothing to commit");
        }
        self.git(["push"]).await?;

        info!(path = %path.display(), label, "history published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    fn git_available() -> bool {
        StdCommand::new("git").arg("--version").output().is_ok()
    }

    fn git_in(dir: &Path, args: &[&str]) -> String {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .expect("git runs");
        assert!(output.status.success(), "git {args:?}: {}", String::from_utf8_lossy(&output.stderr));
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// A checkout at `root/work` whose `origin` is the bare `root/origin.git`.
    fn checkout(root: &Path) -> (PathBuf, PathBuf) {
        let origin = std::path::absolute(root.join("origin.git")).unwrap();
        let work = root.join("work");
        std::fs::create_dir_all(&work).unwrap();
        git_in(root, &["init", "--bare", "-q", "origin.git"]);
        git_in(&work, &["init", "-q"]);
        git_in(&work, &["remote", "add", "origin", &origin.to_string_lossy()]);
        git_in(&work, &["config", "push.default", "current"]);
        (work, origin)
    }

    fn commit_count(origin: &Path) -> usize {
        git_in(origin, &["log", "--all", "--oneline"]).lines().count()
    }

    #[test]
    fn pathspec_is_relative_to_the_workdir() {
        assert_eq!(
            pathspec_for(Path::new("data"), Path::new("data/hot_rank.csv.gz")),
            PathBuf::from("hot_rank.csv.gz")
        );
        assert_eq!(
            pathspec_for(Path::new("/srv/repo/data"), Path::new("/srv/repo/data/daily/a_spot.csv.gz")),
            PathBuf::from("daily/a_spot.csv.gz")
        );
        assert_eq!(
            pathspec_for(Path::new("./data"), Path::new("data/log.txt")),
            PathBuf::from("log.txt")
        );
    }

    #[test]
    fn pathspec_outside_the_workdir_stays_absolute() {
        let pathspec = pathspec_for(Path::new("/srv/repo/data"), Path::new("/tmp/elsewhere.csv.gz"));
        assert_eq!(pathspec, PathBuf::from("/tmp/elsewhere.csv.gz"));
    }

    #[tokio::test]
    async fn outside_a_checkout_publishing_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("hot_rank.csv.gz");
        std::fs::write(&file, b"x").unwrap();

        let settings = PublishSettings {
            user_name: None,
            user_email: None,
            ..PublishSettings::default()
        };
        let publisher = GitPublisher::new(dir.path(), &settings);

        // Either git is missing (Spawn) or `git add` refuses (Failed).
        let err = publisher.publish(&file, "更新数据 2024-01-02").await.unwrap_err();
        assert!(matches!(err, PublishError::Spawn { .. } | PublishError::Failed { .. }));
    }

    #[tokio::test]
    async fn relative_base_dir_commits_and_pushes() {
        if !git_available() {
            return;
        }
        // Created under the process working directory so both paths below
        // are relative, as they are when `base_dir` is configured as `data`.
        let root = TempDir::new_in(".").unwrap();
        assert!(root.path().is_relative());
        let (work, origin) = checkout(root.path());
        let data = work.join("data");
        std::fs::create_dir_all(&data).unwrap();
        let file = data.join("hot_rank.csv.gz");
        std::fs::write(&file, b"day one").unwrap();

        let publisher = GitPublisher::new(&data, &PublishSettings::default());
        publisher.publish(&file, "更新数据 2024-01-02").await.unwrap();

        assert_eq!(commit_count(&origin), 1);
        let subject = git_in(&origin, &["log", "--all", "-1", "--format=%s"]);
        assert_eq!(subject.trim(), "更新数据 2024-01-02");
        let tracked = git_in(&work, &["ls-files"]);
        assert_eq!(tracked.trim(), "data/hot_rank.csv.gz");
    }

    #[tokio::test]
    async fn unchanged_file_publishes_without_a_new_commit() {
        if !git_available() {
            return;
        }
        let root = TempDir::new().unwrap();
        let (work, origin) = checkout(root.path());
        let file = work.join("a_spot.csv.gz");
        std::fs::write(&file, b"same bytes").unwrap();
        let publisher = GitPublisher::new(&work, &PublishSettings::default());

        publisher.publish(&file, "更新数据 2024-01-02").await.unwrap();
        publisher.publish(&file, "更新数据 2024-01-02").await.unwrap();
        assert_eq!(commit_count(&origin), 1);

        std::fs::write(&file, b"new bytes").unwrap();
        publisher.publish(&file, "更新数据 2024-01-03").await.unwrap();
        assert_eq!(commit_count(&origin), 2);
    }

    #[test]
    fn identity_needs_both_name_and_email() {
        let settings = PublishSettings {
            user_email: None,
            ..PublishSettings::default()
        };
        assert!(GitPublisher::new(".", &settings).identity.is_none());
        assert!(GitPublisher::new(".", &PublishSettings::default()).identity.is_some());
    }
}
