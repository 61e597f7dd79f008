use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use motd_dist::config::CliConfig;
use motd_dist::registry::{RegistryClient, UploadMeta};
use motd_dist::targets::{self, HostOs, Target};
use motd_dist::{archive, output, toolchain};

/// Release packager for the motd CLI: cross-compiles every configured
/// target for this host, zips each binary, and optionally publishes the
/// archives to the motd package registry.
#[derive(Parser, Debug)]
#[command(
    name = "motd-dist",
    version,
    about,
    after_help = "Examples:\n  motd-dist build\n  motd-dist build --out-dir release\n  motd-dist publish 1.2.3 tok_abc\n  motd-dist publish 1.2.3 --registry https://registry.example.com\n  motd-dist targets"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build and archive every target configured for this host OS.
    Build {
        #[command(flatten)]
        build_opts: BuildOpts,
    },

    /// Build, archive, and upload every target to the package registry.
    Publish {
        /// Release version to publish (e.g. "1.2.3").
        version: String,

        /// Upload token. Falls back to MOTD_REGISTRY_TOKEN, then the
        /// config file.
        token: Option<String>,

        /// Registry base URL. Falls back to MOTD_REGISTRY_URL, then the
        /// config file, then the built-in default.
        #[arg(long)]
        registry: Option<String>,

        #[command(flatten)]
        build_opts: BuildOpts,
    },

    /// List the build targets configured for this host OS.
    Targets,
}

/// Options shared by the build and publish commands.
#[derive(clap::Args, Debug)]
struct BuildOpts {
    /// Directory containing the motd Cargo project.
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Directory to write archives into.
    #[arg(long, default_value = "dist")]
    out_dir: PathBuf,

    /// Skip installing the Linux cross-compilation gcc packages.
    #[arg(long)]
    skip_deps: bool,
}

// ---------------------------------------------------------------------------
// Subcommand dispatch
// ---------------------------------------------------------------------------

/// Build and archive every target for the host, returning the archive path
/// per target so publish can upload them.
fn package_all(host: HostOs, opts: &BuildOpts) -> Result<Vec<(Target, PathBuf)>> {
    if !opts.project_dir.join("Cargo.toml").is_file() {
        bail!(
            "no Cargo.toml in {}: point --project-dir at the motd project",
            opts.project_dir.display()
        );
    }

    // Fixed packages, so one install pass covers every target.
    if host == HostOs::Linux && !opts.skip_deps {
        output::action("Installing", "cross-compilation toolchains");
        toolchain::install_cross_compilers()
            .context("failed to install cross-compilation toolchains")?;
    }

    let mut archives = Vec::new();
    for target in targets::targets_for(host) {
        output::action("Building", &format!("{} ({})", target.triple, target.alias));

        toolchain::add_target(target.triple)?;
        toolchain::build_release(&opts.project_dir, target.triple)?;

        let binary = toolchain::built_binary_path(&opts.project_dir, target.triple, host)?;
        let archive_path = archive::package_binary(&binary, &opts.out_dir, target.alias, host)?;
        output::detail(&format!("wrote {}", archive_path.display()));

        archives.push((*target, archive_path));
    }

    let paths: Vec<PathBuf> = archives.iter().map(|(_, p)| p.clone()).collect();
    let checksums = archive::write_checksums(&opts.out_dir, &paths)?;
    output::detail(&format!("wrote {}", checksums.display()));

    Ok(archives)
}

fn run_build(opts: &BuildOpts) -> Result<()> {
    let host = HostOs::detect()?;
    let archives = package_all(host, opts)?;
    output::success(
        "Packaged",
        &format!(
            "{} archive(s) in {}",
            archives.len(),
            opts.out_dir.display()
        ),
    );
    Ok(())
}

fn run_publish(
    version: &str,
    token: Option<&str>,
    registry: Option<&str>,
    opts: &BuildOpts,
) -> Result<()> {
    let host = HostOs::detect()?;

    // Resolve credentials before any build work so a missing token fails
    // fast instead of after minutes of compilation.
    let config = CliConfig::load()
        .context("failed to load config; check ~/.motd-dist/config.toml for syntax errors")?;
    let resolved = config.resolve_registry_url(registry);
    if resolved.is_non_https {
        output::note(&format!("registry URL is not HTTPS: {}", resolved.url));
    }
    let token = config.resolve_token(token).ok_or_else(|| {
        anyhow::anyhow!(
            "no upload token: pass it as the second argument, set \
             MOTD_REGISTRY_TOKEN, or add `token` to ~/.motd-dist/config.toml"
        )
    })?;

    let client = RegistryClient::new(&resolved.url, &token)?;
    let archives = package_all(host, opts)?;

    for (target, archive_path) in &archives {
        output::action(
            "Publishing",
            &format!("{} v{version} to {}", target.alias, resolved.url),
        );
        publish_archive(&client, version, target, archive_path, &mut std::io::stdout())?;
    }

    output::success(
        "Published",
        &format!(
            "{} archive(s) as {} v{version}",
            archives.len(),
            targets::APP_NAME
        ),
    );
    Ok(())
}

/// Upload one archive, writing the registry's response body to `out`
/// verbatim before acting on the HTTP status. The server's answer stays
/// visible even when a bad status aborts the run.
fn publish_archive(
    client: &RegistryClient,
    version: &str,
    target: &Target,
    archive_path: &Path,
    out: &mut dyn std::io::Write,
) -> Result<()> {
    let meta = UploadMeta::for_alias(version, target.alias)?;
    let resp = client.publish(&meta, archive_path)?;
    writeln!(out, "{}", resp.body).ok();
    resp.check_status()
}

fn run_targets() -> Result<()> {
    run_targets_inner(&mut std::io::stdout(), HostOs::detect()?, env!("TARGET"))
}

/// Inner implementation of `targets` that writes to a `Write` impl so tests
/// can capture the listing.
fn run_targets_inner(w: &mut dyn std::io::Write, host: HostOs, native: &str) -> Result<()> {
    writeln!(w, "Targets for {} hosts:", host.as_str()).ok();
    for target in targets::targets_for(host) {
        let marker = if target.triple == native {
            " (native)"
        } else {
            ""
        };
        writeln!(w, "  {:32} {}{}", target.triple, target.alias, marker).ok();
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Build { build_opts } => run_build(&build_opts),
        Command::Publish {
            version,
            token,
            registry,
            build_opts,
        } => run_publish(&version, token.as_deref(), registry.as_deref(), &build_opts),
        Command::Targets => run_targets(),
    };

    if let Err(e) = result {
        output::fail("error:", &format!("{e:#}"));
        process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
