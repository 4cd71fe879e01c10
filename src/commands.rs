use crate::cli::{Cli, Commands, InstallArgs, UpdateArgs};
use crate::downloader::{DownloadRequest, Downloader};
use crate::index::load_index_from_path;
use crate::lockfile::{Lockfile, LockfileError};
use crate::modlist::ModList;
use crate::portal::{PortalClient, PortalProvider};
use crate::requirement::Requirement;
use crate::resolver::PackageProvider;
use color_eyre::eyre::{Result, WrapErr, eyre};
use console::Style;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub fn execute(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Update(args) => update(&cli, args),
        Commands::Install(args) => install(&cli, args),
    }
}

/// One requirement per line; blank lines and `#` comments are skipped.
fn load_mod_list(path: &Path) -> Result<Vec<Requirement>> {
    let data = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read mod list {}", path.display()))?;
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.parse::<Requirement>().map_err(Into::into))
        .collect()
}

/// Resolve the requirement list into a fresh lockfile, against the portal
/// or a local index.
fn resolve_lock(cli: &Cli, index: Option<&Path>) -> Result<Lockfile> {
    let requirements = load_mod_list(&cli.mods)?;
    let resolved = match index {
        Some(path) => load_index_from_path(path)?.resolve(&requirements)?,
        None => {
            let provider = PortalProvider::new(PortalClient::from_env()?, cli.game_version.clone());
            provider.resolve(&requirements)?
        }
    };
    Ok(Lockfile::from_resolution(&resolved))
}

fn update(cli: &Cli, args: &UpdateArgs) -> Result<()> {
    let lock = resolve_lock(cli, args.index.as_deref())?;
    lock.save_to_path(&cli.lock)?;

    let green = Style::new().green();
    println!(
        "{} locked {} mod(s) to {}",
        green.apply_to("✓"),
        lock.entries.len(),
        cli.lock.display()
    );
    for entry in &lock.entries {
        println!("  {} {}", entry.name, entry.version);
    }
    Ok(())
}

fn install(cli: &Cli, args: &InstallArgs) -> Result<()> {
    let lock = match Lockfile::load_from_path(&cli.lock) {
        Ok(lock) => lock,
        Err(LockfileError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            println!("lockfile {} not found, generating it", cli.lock.display());
            let lock = resolve_lock(cli, args.index.as_deref())?;
            lock.save_to_path(&cli.lock)?;
            lock
        }
        Err(LockfileError::Malformed(e)) => {
            return Err(e).wrap_err_with(|| {
                format!("lockfile {} is malformed; fix it or delete it", cli.lock.display())
            });
        }
        Err(LockfileError::Io(e)) => {
            return Err(e)
                .wrap_err_with(|| format!("failed to read lockfile {}", cli.lock.display()));
        }
    };

    fs::create_dir_all(&args.target)?;

    let client = PortalClient::from_env()?;
    let mut requests = Vec::with_capacity(lock.entries.len());
    for entry in &lock.entries {
        // Lockfiles are editable; never let a file name walk out of the
        // target directory.
        if entry.file_name.contains(['/', '\\']) {
            return Err(eyre!("refusing suspicious file name {:?}", entry.file_name));
        }
        let url = client.download_url(&entry.download_url, &args.username, &args.token)?;
        requests.push(DownloadRequest {
            url: url.to_string(),
            destination: args.target.join(&entry.file_name),
            sha1: entry.sha1.clone(),
        });
    }

    println!(
        "downloading {} mod(s) into {}",
        requests.len(),
        args.target.display()
    );
    let downloader = Downloader::new();
    let runtime = tokio::runtime::Runtime::new()?;
    let results = runtime.block_on(downloader.download_parallel(requests, args.concurrency));

    let red = Style::new().red();
    let mut failures = 0;
    for result in &results {
        if let Err(e) = result {
            eprintln!("{} {e}", red.apply_to("✗"));
            failures += 1;
        }
    }
    if failures > 0 {
        return Err(eyre!("{failures} of {} download(s) failed", results.len()));
    }

    ModList::enabling(&lock.entries).write_to_dir(&args.target)?;

    let green = Style::new().green();
    println!(
        "{} installed {} mod(s) into {}",
        green.apply_to("✓"),
        lock.entries.len(),
        args.target.display()
    );
    Ok(())
}
