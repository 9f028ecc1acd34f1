//! Builtin command tests through the shell
//!
//! Covers: env/export/unset, filesystem builtins, option errors and
//! custom builtins registered on the builder.

use minsh::{Builtin, BuiltinContext, Completion, Shell, async_trait};
use pretty_assertions::assert_eq;
use std::path::Path;

fn shell(dir: &Path) -> Shell {
    Shell::builder()
        .inherit_process_env(false)
        .no_dotenv()
        .cwd(dir)
        .build()
}

mod environment {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn env_lists_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = Shell::builder()
            .inherit_process_env(false)
            .no_dotenv()
            .cwd(dir.path())
            .env("ZED", "last")
            .env("ALPHA", "first")
            .build();
        shell.exec("export MIDDLE=\"a b\"").await.unwrap();

        let result = shell.exec("env").await.unwrap();
        assert_eq!(result.stdout, "ALPHA=first\nMIDDLE=a b\nZED=last\n");
    }

    #[tokio::test]
    async fn export_without_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());

        shell.exec("export EMPTY").await.unwrap();
        assert_eq!(shell.env().get("EMPTY"), Some(""));
        assert!(shell.env().is_exported("EMPTY"));

        shell.exec("export KEEP=value").await.unwrap();
        shell.exec("export KEEP").await.unwrap();
        assert_eq!(shell.env().get("KEEP"), Some("value"));
    }

    #[tokio::test]
    async fn export_reports_bad_names_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());

        let result = shell.exec("export GOOD=1 bad=2 ALSO_GOOD=3").await.unwrap();
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "export: not a valid identifier: bad=2\n");
        assert_eq!(shell.env().get("GOOD"), Some("1"));
        assert_eq!(shell.env().get("ALSO_GOOD"), Some("3"));
    }

    #[tokio::test]
    async fn unset_removes_variable() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());

        shell.exec("export GONE=soon").await.unwrap();
        let result = shell.exec("unset GONE 9X").await.unwrap();
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "unset: not a valid identifier: 9X\n");
        assert!(!shell.env().contains("GONE"));
        assert!(!shell.env().is_exported("GONE"));

        let result = shell.exec("echo [$GONE]").await.unwrap();
        assert_eq!(result.stdout, "[]\n");
    }
}

mod filesystem {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn mkdir_touch_ls_rm() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());

        assert!(shell.exec("mkdir -p a/b/c").await.unwrap().is_success());
        assert!(shell.exec("touch a/b/file.txt").await.unwrap().is_success());

        let result = shell.exec("ls a/b").await.unwrap();
        assert_eq!(result.stdout, "c\nfile.txt\n");

        let result = shell.exec("rm a").await.unwrap();
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "rm: cannot remove 'a': Is a directory\n");

        assert!(shell.exec("rm -r a").await.unwrap().is_success());
        assert!(!dir.path().join("a").exists());
    }

    #[tokio::test]
    async fn ls_defaults_to_session_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("inner")).unwrap();
        std::fs::write(dir.path().join("inner/x.txt"), "x").unwrap();
        let mut shell = shell(dir.path());

        shell.exec("cd inner").await.unwrap();
        let result = shell.exec("ls").await.unwrap();
        assert_eq!(result.stdout, "x.txt\n");
    }

    #[tokio::test]
    async fn rm_force_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());

        let result = shell.exec("rm missing.txt").await.unwrap();
        assert_eq!(result.exit_code, 1);
        assert_eq!(
            result.stderr,
            "rm: cannot remove 'missing.txt': No such file or directory\n"
        );

        let result = shell.exec("rm -f missing.txt").await.unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stderr, "");
    }

    #[tokio::test]
    async fn invalid_options_exit_two() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());

        for line in ["ls -z", "mkdir -q x", "rm -x y", "touch -a z"] {
            let result = shell.exec(line).await.unwrap();
            assert_eq!(result.exit_code, 2, "{line}");
            assert!(result.stderr.contains("invalid option"), "{line}");
        }
    }

    #[tokio::test]
    async fn cd_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plain.txt"), "").unwrap();
        let mut shell = shell(dir.path());

        let result = shell.exec("cd nowhere").await.unwrap();
        assert_eq!(result.stderr, "cd: no such file or directory: nowhere\n");
        let result = shell.exec("cd plain.txt").await.unwrap();
        assert_eq!(result.stderr, "cd: not a directory: plain.txt\n");
        assert_eq!(shell.cwd(), dir.path());
    }
}

mod output {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn echo_flags() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());

        assert_eq!(shell.exec("echo -n no newline").await.unwrap().stdout, "no newline");
        assert_eq!(shell.exec("echo -e 'a\\tb'").await.unwrap().stdout, "a\tb\n");
        assert_eq!(shell.exec("echo -x").await.unwrap().stdout, "-x\n");
        assert_eq!(shell.exec("echo").await.unwrap().stdout, "\n");
    }

    #[tokio::test]
    async fn pwd_prints_session_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());
        let result = shell.exec("pwd").await.unwrap();
        assert_eq!(result.stdout, format!("{}\n", dir.path().display()));
    }
}

mod custom {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Count;

    #[async_trait]
    impl Builtin for Count {
        async fn execute(&self, mut ctx: BuiltinContext<'_>) -> minsh::Result<Completion> {
            let input = ctx.stdin.unwrap_or_default();
            let lines = input.iter().filter(|b| **b == b'\n').count();
            ctx.io.write_stdout(format!("{}\n", lines))?;
            Ok(Completion::SUCCESS)
        }
    }

    struct Fails;

    #[async_trait]
    impl Builtin for Fails {
        async fn execute(&self, _ctx: BuiltinContext<'_>) -> minsh::Result<Completion> {
            Err(minsh::Error::Internal("backend unavailable".to_string()))
        }
    }

    fn custom_shell(dir: &Path) -> Shell {
        Shell::builder()
            .inherit_process_env(false)
            .no_dotenv()
            .cwd(dir)
            .builtin("count", Box::new(Count))
            .builtin("fails", Box::new(Fails))
            .build()
    }

    #[tokio::test]
    async fn custom_builtin_reads_pipe() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = custom_shell(dir.path());
        let result = shell.exec("echo -e 'a\\nb' | count").await.unwrap();
        assert_eq!(result.stdout, "2\n");

        let result = shell.exec("count").await.unwrap();
        assert_eq!(result.stdout, "0\n");
    }

    #[tokio::test]
    async fn custom_builtin_reads_redirect() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("three.txt"), "1\n2\n3\n").unwrap();
        let mut shell = custom_shell(dir.path());
        let result = shell.exec("count < three.txt").await.unwrap();
        assert_eq!(result.stdout, "3\n");
    }

    #[tokio::test]
    async fn builtin_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = custom_shell(dir.path());
        let result = shell.exec("fails").await.unwrap();
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "fails: internal error: backend unavailable\n");
    }

    #[tokio::test]
    async fn custom_builtin_replaces_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = Shell::builder()
            .inherit_process_env(false)
            .no_dotenv()
            .cwd(dir.path())
            .builtin("echo", Box::new(Count))
            .build();
        let result = shell.exec("echo anything").await.unwrap();
        assert_eq!(result.stdout, "0\n");
    }
}
