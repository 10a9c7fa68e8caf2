//! Shared model registry.
//!
//! The models are trained once at startup and then served read-only, so
//! the registry hands out `Arc` snapshots that readers can query without
//! coordination. Retraining never mutates a live model: a replacement is
//! built fully, then published with an atomic swap.

use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::io;
use crate::model::char_model::CharNgramModel;
use crate::model::language_model::LanguageModel;

/// Explicit registry for the process-wide models.
///
/// Replaces hidden global singletons: construct one at startup and pass
/// (or inject) it into every component that queries the models. Fresh
/// registries for tests are just `ModelRegistry::new()`.
///
/// # Responsibilities
/// - Build both models from one or more corpus files, tolerating
///   individually unreadable corpora
/// - Hand out cheap read snapshots (`Arc` clones)
/// - Publish replacement models atomically for hot reload
#[derive(Debug, Default)]
pub struct ModelRegistry {
	word_model: RwLock<Arc<LanguageModel>>,
	char_model: RwLock<Arc<CharNgramModel>>,
}

impl ModelRegistry {
	/// Creates a registry holding empty, untrained models.
	///
	/// Queries against them answer the documented fallbacks (epsilon
	/// probabilities, empty candidate lists) rather than failing.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a registry by training on a set of corpus files.
	///
	/// # Parameters
	/// - `corpus_paths`: Plain-text corpora; snapshots are used when
	///   present (see `LanguageModel::from_corpus_file`).
	///
	/// # Behavior
	/// - Corpora are merged into one word model; the character model is
	///   then trained over the resulting vocabulary.
	/// - A corpus that fails to load is logged and skipped; training
	///   continues with whatever loaded.
	///
	/// # Errors
	/// Returns an error only when every corpus failed, so startup is
	/// never one broken file away from being unrecoverable while any
	/// usable data exists.
	pub fn from_corpora<P: AsRef<Path>>(corpus_paths: &[P]) -> Result<Self, Box<dyn std::error::Error>> {
		let mut word_model = LanguageModel::new();
		let mut loaded = 0usize;

		for path in corpus_paths {
			match LanguageModel::from_corpus_file(path) {
				Ok(partial) => {
					word_model.merge(&partial);
					loaded += 1;
				}
				Err(error) => {
					log::warn!(
						"Skipping corpus {}: {}",
						path.as_ref().display(),
						error
					);
				}
			}
		}

		if loaded == 0 && !corpus_paths.is_empty() {
			return Err("No corpus could be loaded".into());
		}

		let mut char_model = CharNgramModel::default();
		char_model.train(word_model.vocabulary());

		log::info!(
			"Registry ready: {} corpora, {} words, {} unique",
			loaded,
			word_model.total_words(),
			word_model.vocabulary_size()
		);

		let registry = Self::new();
		registry.replace_word_model(Arc::new(word_model));
		registry.replace_char_model(Arc::new(char_model));
		Ok(registry)
	}

	/// Builds a registry from every `.txt` corpus in a directory.
	///
	/// # Parameters
	/// - `dir`: Directory containing corpus files. Only files directly
	///   in the directory are considered; subdirectories are ignored.
	///
	/// # Errors
	/// Returns an error if the directory cannot be read, or if none of
	/// the corpora inside it could be loaded.
	pub fn from_corpus_dir<P: AsRef<Path>>(dir: P) -> Result<Self, Box<dyn std::error::Error>> {
		let dir = dir.as_ref();
		let paths: Vec<_> = io::list_files(dir, "txt")?
			.into_iter()
			.map(|name| dir.join(name))
			.collect();
		Self::from_corpora(&paths)
	}

	/// Returns a read snapshot of the word model.
	///
	/// The snapshot stays valid (and unchanged) even if a retrain swaps
	/// in a replacement while the caller still holds it.
	pub fn word_model(&self) -> Arc<LanguageModel> {
		self.word_model
			.read()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.clone()
	}

	/// Returns a read snapshot of the character model.
	pub fn char_model(&self) -> Arc<CharNgramModel> {
		self.char_model
			.read()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.clone()
	}

	/// Atomically publishes a replacement word model.
	///
	/// The model must be fully built before publishing; readers holding
	/// the previous snapshot keep it until they drop it.
	pub fn replace_word_model(&self, model: Arc<LanguageModel>) {
		let mut slot = self
			.word_model
			.write()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		*slot = model;
	}

	/// Atomically publishes a replacement character model.
	pub fn replace_char_model(&self, model: Arc<CharNgramModel>) {
		let mut slot = self
			.char_model
			.write()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		*slot = model;
	}
}
