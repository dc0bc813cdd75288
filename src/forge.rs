//! Build-framework tools and workspace file access

use rmcp::model::Tool;
use serde::Deserialize;
use std::path::Path;

use crate::command::CommandLine;
use crate::context::FoundryContext;
use crate::error::ToolResult;
use crate::foundry::{Binary, Toolchain};
use crate::schema::ToolSpec;

#[derive(Debug, Deserialize)]
pub struct ScriptArgs {
    pub script_path: String,
    pub sig: Option<String>,
    #[serde(default)]
    pub broadcast: bool,
    #[serde(default)]
    pub verify: bool,
    pub private_key: Option<String>,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InstallArgs {
    pub dependency: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFileArgs {
    pub file_path: String,
    pub content: String,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReadFileArgs {
    pub file_path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListFilesArgs {
    pub directory: Option<String>,
}

pub fn tools() -> Vec<Tool> {
    vec![
        ToolSpec::new(
            "forge_script",
            "Run a Solidity script from the workspace with forge. Transactions are only \
             published when broadcast is set; the signing key (argument or configured) is \
             only attached when broadcasting.",
        )
        .string(
            "script_path",
            "Script path relative to the workspace, e.g. script/Deploy.s.sol",
            true,
        )
        .string("sig", "Function to run, e.g. run() or deploy(uint256) (default: run())", false)
        .boolean("broadcast", "Publish the script's transactions")
        .boolean("verify", "Verify deployed contracts on the block explorer")
        .string("private_key", "Private key to broadcast with", false)
        .string(
            "rpc_url",
            "RPC URL or foundry.toml rpc_endpoints alias (defaults to the configured RPC URL)",
            false,
        )
        .build(),
        ToolSpec::new(
            "install_dependency",
            "Install a Solidity dependency into the workspace with forge install.",
        )
        .string(
            "dependency",
            "Dependency to install, e.g. OpenZeppelin/openzeppelin-contracts or a git URL",
            true,
        )
        .build(),
        ToolSpec::new(
            "create_solidity_file",
            "Create a file in the workspace, e.g. a contract under src/ or a script under script/. \
             Parent directories are created. Existing files are only replaced with overwrite.",
        )
        .string("file_path", "Path relative to the workspace root", true)
        .string("content", "File content", true)
        .boolean("overwrite", "Replace the file if it already exists")
        .build(),
        ToolSpec::new("read_file", "Read a file from the workspace.")
            .string("file_path", "Path relative to the workspace root", true)
            .build(),
        ToolSpec::new(
            "list_files",
            "List every file in the workspace or one of its directories, recursively.",
        )
        .string("directory", "Directory relative to the workspace root (default: the root)", false)
        .build(),
    ]
}

/// The `forge script` command line. `private_key` is dropped unless broadcasting.
pub fn script_command(
    toolchain: &Toolchain,
    args: &ScriptArgs,
    rpc_url: &str,
    private_key: Option<&str>,
    workspace: &Path,
) -> CommandLine {
    toolchain
        .command(Binary::Forge)
        .arg("script")
        .arg(&args.script_path)
        .opt("--sig", args.sig.as_deref())
        .opt("--rpc-url", Some(rpc_url))
        .flag("--broadcast", args.broadcast)
        .flag("--verify", args.verify)
        .opt("--private-key", private_key.filter(|_| args.broadcast))
        .current_dir(workspace)
}

/// The workspace is not a git checkout, so dependencies are cloned without submodules.
pub fn install_command(toolchain: &Toolchain, args: &InstallArgs, workspace: &Path) -> CommandLine {
    toolchain
        .command(Binary::Forge)
        .arg("install")
        .flag("--no-git", true)
        .arg(&args.dependency)
        .current_dir(workspace)
}

pub async fn script(ctx: &FoundryContext, args: ScriptArgs) -> ToolResult<String> {
    let root = ctx.workspace_root().await?;
    let rpc_url = ctx.rpc.resolve(args.rpc_url.as_deref());
    let key = ctx.config.signing_key(args.private_key.as_deref());
    ctx.run(&script_command(&ctx.toolchain, &args, &rpc_url, key.as_deref(), &root))
        .await
}

pub async fn install(ctx: &FoundryContext, args: InstallArgs) -> ToolResult<String> {
    let root = ctx.workspace_root().await?;
    let output = ctx.run(&install_command(&ctx.toolchain, &args, &root)).await?;
    tracing::info!(dependency = %args.dependency, "dependency installed");
    if output.trim().is_empty() {
        Ok(format!("Installed {}", args.dependency))
    } else {
        Ok(output)
    }
}

pub async fn create_file(ctx: &FoundryContext, args: CreateFileArgs) -> ToolResult<String> {
    ctx.workspace_root().await?;
    let path = ctx
        .workspace
        .write_file(&args.file_path, &args.content, args.overwrite)
        .await?;
    tracing::info!(path = %path.display(), "file written");
    Ok(format!("File written to {}", path.display()))
}

pub async fn read_file(ctx: &FoundryContext, args: ReadFileArgs) -> ToolResult<String> {
    ctx.workspace_root().await?;
    ctx.workspace.read_file(&args.file_path).await
}

pub async fn list_files(ctx: &FoundryContext, args: ListFilesArgs) -> ToolResult<String> {
    ctx.workspace_root().await?;
    let directory = args.directory.as_deref().filter(|d| !d.trim().is_empty());
    let files = ctx.workspace.list_files(directory).await?;
    if files.is_empty() {
        Ok("No files found".to_string())
    } else {
        Ok(files.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::context::tests::Harness;
    use crate::error::ToolError;
    use crate::executor::tests::FakeRunner;
    use crate::executor::CommandResult;

    fn script_args(broadcast: bool, private_key: Option<&str>) -> ScriptArgs {
        ScriptArgs {
            script_path: "script/Deploy.s.sol".into(),
            sig: None,
            broadcast,
            verify: false,
            private_key: private_key.map(str::to_string),
            rpc_url: None,
        }
    }

    #[test]
    fn test_script_command_dry_run_drops_key() {
        let cmd = script_command(
            &Toolchain::default(),
            &script_args(false, None),
            "http://localhost:8545",
            Some("0xkey"),
            Path::new("/ws"),
        );
        assert_eq!(
            cmd.args,
            vec!["script", "script/Deploy.s.sol", "--rpc-url", "http://localhost:8545"]
        );
        assert_eq!(cmd.cwd.as_deref(), Some(Path::new("/ws")));
    }

    #[test]
    fn test_script_command_broadcast_with_key() {
        let mut args = script_args(true, None);
        args.sig = Some("deploy(uint256)".into());
        args.verify = true;
        let cmd = script_command(
            &Toolchain::default(),
            &args,
            "http://localhost:8545",
            Some("0xkey"),
            Path::new("/ws"),
        );
        assert_eq!(cmd.flag_value("--sig"), Some("deploy(uint256)"));
        assert!(cmd.has_flag("--broadcast"));
        assert!(cmd.has_flag("--verify"));
        assert_eq!(cmd.flag_value("--private-key"), Some("0xkey"));
    }

    #[tokio::test]
    async fn test_script_runs_in_workspace_with_configured_key() {
        let config = Config {
            private_key: Some("0xconfigured".into()),
            ..Config::default()
        };
        let harness = Harness::with_config(FakeRunner::new(), config);

        script(&harness.ctx, script_args(true, None)).await.unwrap();

        let calls = harness.runner.calls();
        // forge init, then the script
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args[0], "init");
        assert_eq!(calls[1].args[0], "script");
        assert_eq!(calls[1].cwd.as_deref(), Some(harness.ctx.config.workspace.as_path()));
        assert_eq!(calls[1].flag_value("--private-key"), Some("0xconfigured"));
    }

    #[tokio::test]
    async fn test_install_dependency() {
        let harness = Harness::new(FakeRunner::new());
        let text = install(
            &harness.ctx,
            InstallArgs {
                dependency: "OpenZeppelin/openzeppelin-contracts".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(text, "Installed OpenZeppelin/openzeppelin-contracts");
        let calls = harness.runner.calls();
        assert_eq!(
            calls[1].args,
            vec!["install", "--no-git", "OpenZeppelin/openzeppelin-contracts"]
        );
    }

    #[tokio::test]
    async fn test_failed_workspace_init_stops_the_tool() {
        let harness = Harness::new(
            FakeRunner::new().respond(&["init"], CommandResult::failure("Error: git not found")),
        );
        let err = read_file(
            &harness.ctx,
            ReadFileArgs {
                file_path: "src/A.sol".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Error: git not found");
    }

    #[tokio::test]
    async fn test_create_read_and_list_files() {
        let harness = Harness::new(FakeRunner::new());

        let created = create_file(
            &harness.ctx,
            CreateFileArgs {
                file_path: "src/Token.sol".into(),
                content: "contract Token {}".into(),
                overwrite: false,
            },
        )
        .await
        .unwrap();
        assert!(created.contains("src/Token.sol"));

        let content = read_file(
            &harness.ctx,
            ReadFileArgs {
                file_path: "src/Token.sol".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(content, "contract Token {}");

        let listed = list_files(
            &harness.ctx,
            ListFilesArgs {
                directory: Some("src".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(listed, "Token.sol");
    }

    #[tokio::test]
    async fn test_create_existing_without_overwrite() {
        let harness = Harness::new(FakeRunner::new());
        let args = || CreateFileArgs {
            file_path: "src/A.sol".into(),
            content: "first".into(),
            overwrite: false,
        };
        create_file(&harness.ctx, args()).await.unwrap();
        let err = create_file(&harness.ctx, args()).await.unwrap_err();
        assert!(matches!(err, ToolError::FileExists(_)));
    }

    #[tokio::test]
    async fn test_list_empty_directory_message() {
        let harness = Harness::new(FakeRunner::new());
        std::fs::create_dir_all(harness.ctx.config.workspace.join("script")).unwrap();
        let listed = list_files(
            &harness.ctx,
            ListFilesArgs {
                directory: Some("script".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(listed, "No files found");
    }
}
