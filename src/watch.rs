use crate::{EngineCommand, SongLibrary};
use crossbeam::channel::Sender;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

/// Reloads the library whenever the file at `path` changes and hands it to
/// the engine. The watcher stops when the returned value is dropped.
///
/// The parent directory is watched rather than the file itself, because
/// editors that save by renaming replace the watched inode.
pub fn watch_library(
    path: &Path,
    command_tx: Sender<EngineCommand>,
) -> notify::Result<RecommendedWatcher> {
    let path = path.canonicalize()?;
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let watched = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                let touches_library = event.paths.iter().any(|p| p == &watched);
                if touches_library && (event.kind.is_modify() || event.kind.is_create()) {
                    reload(&watched, &command_tx);
                }
            }
            Err(e) => tracing::warn!("watch error: {}", e),
        },
        Config::default(),
    )?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    tracing::info!(path = %path.display(), "watching song library");

    Ok(watcher)
}

fn reload(path: &Path, command_tx: &Sender<EngineCommand>) {
    match SongLibrary::load(path) {
        Ok(library) => {
            tracing::info!(path = %path.display(), "song library changed, reloading");
            let _ = command_tx.send(EngineCommand::ReloadLibrary(library));
        }
        // Half-written files are common mid-save; the next event retries.
        Err(e) => tracing::warn!(path = %path.display(), "ignoring library change: {}", e),
    }
}
