use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use canopy_diff::{diff, render_json, render_listing, render_with, Delta, DeltaKind, Painter};
use canopy_store::{FsObjectStore, ObjectStore};
use canopy_sync::{Applier, ApplyOutcome};
use canopy_tree::{LocalTree, MutationOptions, TargetTree, TreeError, TreeReader, VersionedTree};
use canopy_types::{validate_name, CancelToken, TreePath};
use colored::Colorize;
use serde_json::json;
use tracing::{debug, warn};

use crate::cli::*;
use crate::config::{resolve_home, CanopyConfig};
use crate::link;
use crate::state::SyncState;

const CLEAN: &str = "nothing to commit, working tree clean";

pub fn run_command(cli: Cli, cancel: CancelToken) -> anyhow::Result<()> {
    let home = resolve_home(cli.home)?;
    let cwd = std::env::current_dir().context("reading the current directory")?;
    let ctx = Context::new(home, cwd, cli.format, cancel)?;
    match cli.command {
        Command::Init(args) => ctx.init(args),
        Command::Status(_) => ctx.status(),
        Command::Commit(args) => ctx.commit(args),
        Command::Cat(args) => ctx.cat(args),
        Command::Ls(args) => ctx.ls(args),
        Command::Tree(args) => ctx.tree(args),
        Command::Log(args) => ctx.log(args),
    }
}

/// Everything a command needs, resolved once up front.
pub struct Context {
    home: PathBuf,
    cwd: PathBuf,
    config: CanopyConfig,
    format: OutputFormat,
    cancel: CancelToken,
}

impl Context {
    pub fn new(
        home: PathBuf,
        cwd: PathBuf,
        format: OutputFormat,
        cancel: CancelToken,
    ) -> anyhow::Result<Self> {
        let config = CanopyConfig::load(&home)?;
        debug!(home = %home.display(), "loaded config");
        Ok(Self {
            home,
            cwd,
            config,
            format,
            cancel,
        })
    }

    fn state_path(&self) -> PathBuf {
        self.config.state_path(&self.home)
    }

    /// Open the target at the persisted version, creating an empty one on
    /// first use.
    fn open_target(&self) -> anyhow::Result<VersionedTree> {
        let store_path = self.config.store_path(&self.home);
        let store: Arc<dyn ObjectStore> = Arc::new(
            FsObjectStore::open(&store_path)
                .with_context(|| format!("opening object store {}", store_path.display()))?,
        );
        let state_path = self.state_path();
        match SyncState::load(&state_path)? {
            Some(state) => VersionedTree::open(store, state.root_version)
                .with_context(|| format!("opening version {}", state.root_version)),
            None => {
                let tree = VersionedTree::create(store).context("creating an empty tree")?;
                SyncState::new(tree.version()).save(&state_path)?;
                Ok(tree)
            }
        }
    }

    fn persist(&self, target: &VersionedTree) -> anyhow::Result<()> {
        SyncState::new(target.version()).save(&self.state_path())
    }

    fn local(&self) -> LocalTree {
        LocalTree::new(&self.cwd)
    }

    fn delta(&self, target: &VersionedTree, link: &TreePath) -> anyhow::Result<Delta> {
        let options = self.config.diff_options(self.cancel.clone());
        diff(link, &TreePath::root(), target, &self.local(), &options)
            .with_context(|| format!("comparing {} with {}", self.cwd.display(), link))
    }

    fn init(&self, args: InitArgs) -> anyhow::Result<()> {
        let name = match args.name {
            Some(name) => name,
            None => self
                .cwd
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .context("the current directory has no usable name; pass --name")?,
        };
        validate_name(&name)?;
        let root = TreePath::parse(&self.config.project_root)?;
        let path = root.join(&name);

        let target = self.open_target()?;
        match target.list(&path) {
            Err(e) if e.is_not_found() => {}
            Ok(_) | Err(TreeError::NotADirectory { .. }) => bail!("{path} already exists"),
            Err(e) => return Err(e).with_context(|| format!("checking {path}")),
        }

        let link_path = link::write(&self.cwd, &self.config.link_file, &path)?;
        if let Err(e) = target.make_directory(&path, MutationOptions::COMMIT) {
            if let Err(cleanup) = std::fs::remove_file(&link_path) {
                warn!(error = %cleanup, path = %link_path.display(), "could not remove link file");
            }
            return Err(e).with_context(|| format!("creating {path}"));
        }
        self.persist(&target)?;

        match self.format {
            OutputFormat::Json => println!(
                "{}",
                json!({ "path": path.to_string(), "version": target.version().to_hex() })
            ),
            OutputFormat::Text => {
                println!(
                    "{} Linked {} to {}",
                    "✓".green().bold(),
                    self.cwd.display().to_string().bold(),
                    path.to_string().cyan()
                );
                println!("  Version: {}", target.version().short_hex().yellow());
            }
        }
        Ok(())
    }

    fn status(&self) -> anyhow::Result<()> {
        let link = link::read(&self.cwd, &self.config.link_file)?;
        let target = self.open_target()?;
        let delta = self.delta(&target, &link)?;

        match self.format {
            OutputFormat::Json => println!("{}", render_json(&delta)?),
            OutputFormat::Text if delta.is_unchanged() => println!("{CLEAN}"),
            OutputFormat::Text => {
                print!("{}", render_with(&delta, &Colors));
                println!("\n{}", delta.counts().to_string().dimmed());
            }
        }
        Ok(())
    }

    fn commit(&self, args: CommitArgs) -> anyhow::Result<()> {
        let link = link::read(&self.cwd, &self.config.link_file)?;
        let target = self.open_target()?;
        let delta = self.delta(&target, &link)?;
        if delta.is_unchanged() && self.format == OutputFormat::Text {
            println!("{CLEAN}");
            return Ok(());
        }

        let local = self.local();
        let message = args.message.unwrap_or_else(|| format!("sync {link}"));
        let outcome = Applier::new(&target, &local)
            .with_cancel(self.cancel.clone())
            .with_message(message)
            .apply(&link, &TreePath::root(), &delta)?;
        if outcome.committed {
            self.persist(&target)?;
        }
        self.print_outcome(&outcome);
        Ok(())
    }

    fn print_outcome(&self, outcome: &ApplyOutcome) {
        let summary = &outcome.summary;
        match self.format {
            OutputFormat::Json => println!(
                "{}",
                json!({
                    "version": outcome.version.to_hex(),
                    "previous": outcome.previous.to_hex(),
                    "committed": outcome.committed,
                    "summary": summary,
                })
            ),
            OutputFormat::Text if !outcome.committed => println!("{CLEAN}"),
            OutputFormat::Text => {
                println!(
                    "{} Committed {}",
                    "✓".green().bold(),
                    outcome.version.short_hex().yellow()
                );
                println!(
                    "  {} files written ({} bytes), {} directories created, {} removed",
                    summary.files_written,
                    summary.bytes_written,
                    summary.directories_created,
                    summary.paths_removed
                );
            }
        }
    }

    fn cat(&self, args: CatArgs) -> anyhow::Result<()> {
        let path = TreePath::parse(&args.path)?;
        let target = self.open_target()?;
        let bytes = target.read(&path).with_context(|| format!("reading {path}"))?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.flush()?;
        Ok(())
    }

    fn ls(&self, args: LsArgs) -> anyhow::Result<()> {
        let path = TreePath::parse(args.path.as_deref().unwrap_or(""))?;
        let target = self.open_target()?;
        let entries = target.list(&path).with_context(|| format!("listing {path}"))?;
        match self.format {
            OutputFormat::Json => {
                let entries: Vec<_> = entries
                    .iter()
                    .map(|e| {
                        json!({
                            "name": e.name,
                            "kind": e.kind,
                            "size": e.fingerprint.map(|f| f.size),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
            OutputFormat::Text => {
                for entry in &entries {
                    if entry.is_dir() {
                        println!("{}", format!("{}/", entry.name).blue().bold());
                    } else {
                        println!("{}", entry.name);
                    }
                }
            }
        }
        Ok(())
    }

    fn tree(&self, args: TreeArgs) -> anyhow::Result<()> {
        let path = TreePath::parse(&args.path)?;
        let target = self.open_target()?;
        let out = render_listing(&target, &path).with_context(|| format!("listing {path}"))?;
        print!("{out}");
        Ok(())
    }

    fn log(&self, args: LogArgs) -> anyhow::Result<()> {
        let target = self.open_target()?;
        let history = target.history(args.limit)?;
        match self.format {
            OutputFormat::Json => {
                let entries: Vec<_> = history
                    .iter()
                    .map(|h| {
                        json!({
                            "version": h.id.to_hex(),
                            "seq": h.version.seq,
                            "root": h.version.root.to_hex(),
                            "message": h.version.message,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
            OutputFormat::Text => {
                for entry in &history {
                    println!(
                        "{} {} {}",
                        format!("v{}", entry.version.seq).yellow().bold(),
                        entry.id.short_hex().dimmed(),
                        entry.version.message
                    );
                }
            }
        }
        Ok(())
    }
}

/// Terminal colours for rendered deltas.
struct Colors;

impl Painter for Colors {
    fn paint(&self, kind: &DeltaKind, text: &str) -> String {
        match kind {
            DeltaKind::Unchanged => text.dimmed().to_string(),
            DeltaKind::Added => text.green().to_string(),
            DeltaKind::Changed => text.yellow().to_string(),
            DeltaKind::Removed => text.red().to_string(),
            DeltaKind::Replaced { .. } => text.magenta().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct Fixture {
        _dirs: (tempfile::TempDir, tempfile::TempDir),
        ctx: Context,
    }

    fn fixture() -> Fixture {
        let home = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let cwd = work.path().join("site");
        fs::create_dir(&cwd).unwrap();
        let ctx = Context::new(
            home.path().to_path_buf(),
            cwd,
            OutputFormat::Text,
            CancelToken::new(),
        )
        .unwrap();
        Fixture {
            _dirs: (home, work),
            ctx,
        }
    }

    fn p(s: &str) -> TreePath {
        TreePath::parse(s).unwrap()
    }

    #[test]
    fn init_links_and_creates_the_directory() {
        let f = fixture();
        f.ctx.init(InitArgs { name: None }).unwrap();

        assert_eq!(link::read(&f.ctx.cwd, ".canopy").unwrap(), p("public/site"));
        let target = f.ctx.open_target().unwrap();
        assert!(target.list(&p("public/site")).unwrap().is_empty());
        assert_eq!(target.published().seq, 1);
    }

    #[test]
    fn init_refuses_an_existing_target() {
        let f = fixture();
        f.ctx.init(InitArgs { name: None }).unwrap();
        fs::remove_file(f.ctx.cwd.join(".canopy")).unwrap();

        let err = f.ctx.init(InitArgs { name: None }).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(!f.ctx.cwd.join(".canopy").exists());
    }

    #[test]
    fn commit_publishes_and_persists() {
        let f = fixture();
        f.ctx.init(InitArgs { name: None }).unwrap();
        fs::write(f.ctx.cwd.join("index.md"), "# hello").unwrap();
        fs::create_dir(f.ctx.cwd.join("posts")).unwrap();
        fs::write(f.ctx.cwd.join("posts/one.md"), "first").unwrap();

        f.ctx.commit(CommitArgs { message: Some("publish".into()) }).unwrap();

        // reopening goes through the persisted state
        let target = f.ctx.open_target().unwrap();
        assert_eq!(target.published().message, "publish");
        assert_eq!(target.read(&p("public/site/posts/one.md")).unwrap(), b"first");
        assert!(target.read(&p("public/site/.canopy")).unwrap_err().is_not_found());

        let delta = f.ctx.delta(&target, &p("public/site")).unwrap();
        assert!(delta.is_unchanged());
    }

    #[test]
    fn clean_commit_keeps_the_version() {
        let f = fixture();
        f.ctx.init(InitArgs { name: None }).unwrap();
        let before = f.ctx.open_target().unwrap().version();
        f.ctx.commit(CommitArgs { message: None }).unwrap();
        assert_eq!(f.ctx.open_target().unwrap().version(), before);
    }

    #[test]
    fn status_requires_a_link() {
        let f = fixture();
        let err = f.ctx.status().unwrap_err();
        assert!(err.to_string().contains("is not a linked directory"));
    }

    #[test]
    fn ignored_files_are_not_committed() {
        let f = fixture();
        f.ctx.init(InitArgs { name: Some("notes".into()) }).unwrap();
        fs::write(f.ctx.cwd.join(".canopyignore"), "*.tmp\n").unwrap();
        fs::write(f.ctx.cwd.join("draft.tmp"), "scratch").unwrap();
        fs::write(f.ctx.cwd.join("keep.md"), "keep").unwrap();

        f.ctx.commit(CommitArgs { message: None }).unwrap();
        let target = f.ctx.open_target().unwrap();
        let names: Vec<_> = target
            .list(&p("public/notes"))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["keep.md"]);
    }
}
