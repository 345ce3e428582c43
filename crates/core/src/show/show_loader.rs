use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde_json::from_reader;

use super::show::{Show, ShowError};

/// Finds and loads show files from a shows directory.
pub struct ShowLoader {
    shows_directory: PathBuf,
}

impl ShowLoader {
    pub fn new(shows_directory: impl Into<PathBuf>) -> Self {
        Self {
            shows_directory: shows_directory.into(),
        }
    }

    /// Loader rooted at the current working directory.
    pub fn from_current_dir() -> Result<Self, ShowError> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn shows_directory(&self) -> &Path {
        &self.shows_directory
    }

    /// Resolve a show name the way a user types it: relative names are looked
    /// up in the shows directory, and a missing extension means `.json`.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let mut path = PathBuf::from(name.trim());
        if path.extension().is_none() {
            path.set_extension("json");
        }
        if path.is_relative() {
            self.shows_directory.join(path)
        } else {
            path
        }
    }

    /// Load and validate a show file.
    pub fn load_show(&self, path: &Path) -> Result<Show, ShowError> {
        if !path.is_file() {
            return Err(ShowError::NotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let show: Show = from_reader(BufReader::new(file))?;
        show.validate()?;

        log::info!(
            "Loaded show '{}' ({} channels) from {}",
            show.show_name,
            show.channels.len(),
            path.display()
        );
        Ok(show)
    }

    pub fn list_shows(&self) -> Result<Vec<PathBuf>, ShowError> {
        let entries = fs::read_dir(&self.shows_directory)?;

        let mut shows = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
                shows.push(path);
            }
        }
        shows.sort();

        Ok(shows)
    }
}
