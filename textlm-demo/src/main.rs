use std::sync::Arc;

use textlm_core::model::char_model::CharNgramModel;
use textlm_core::model::hybrid::HybridScorer;
use textlm_core::model::language_model::LanguageModel;
use textlm_core::registry::ModelRegistry;
use textlm_core::tokenizer;

/// A small bundled corpus so the walkthrough runs without any data files.
const CORPUS: &str = "\
The quick brown fox jumps over the lazy dog. \
The lazy dog sleeps in the warm sun. \
The quick brown fox runs through the green field. \
A small cat sat on the old mat. \
The small cat ran through the garden. \
The old dog sat by the door and waited. \
The world is wide and the world is old. \
Hello world, said the quick brown fox.";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Build the registry explicitly: train a word model on the corpus
    // text, then train the character companion model on its vocabulary.
    let mut word_model = LanguageModel::new();
    word_model.train_from_text(CORPUS);

    let mut char_model = CharNgramModel::default();
    char_model.train(word_model.vocabulary());

    println!(
        "Trained on {} words, {} unique",
        word_model.total_words(),
        word_model.vocabulary_size()
    );

    let registry = ModelRegistry::new();
    registry.replace_word_model(Arc::new(word_model));
    registry.replace_char_model(Arc::new(char_model));

    let model = registry.word_model();

    // Perplexity separates fluent from scrambled word order.
    for sentence in ["the quick brown fox jumps", "fox brown quick jumps the"] {
        let tokens = tokenizer::tokenize(sentence);
        println!("Perplexity({:?}) = {:.2}", sentence, model.perplexity(&tokens, 3));
    }

    // Contextual probability: back-off vs fixed-weight interpolation.
    let context = ["quick", "brown"];
    println!(
        "P(fox | quick brown): backoff={:.6} interpolated={:.6}",
        model.probability("fox", &context, 3),
        model.interpolated_probability("fox", &context, 3)
    );

    // Candidate generation recovers a transposition typo in context.
    for (candidate, prob) in model.candidates("wrold", &["hello"], 3, 2) {
        println!("Candidate for 'wrold': {} ({:.6})", candidate, prob);
    }

    // The hybrid scorer folds in spelling plausibility and closeness
    // to the typed word.
    let chars = registry.char_model();
    let scorer = HybridScorer::new(&model, Some(&chars));
    let pool: Vec<String> = model
        .candidates("wrold", &["hello"], 5, 2)
        .into_iter()
        .map(|(word, _)| word)
        .collect();
    for (candidate, score) in scorer.rank_candidates(&pool, &["hello"], Some("wrold")) {
        println!("Hybrid ranking: {} ({:.6})", candidate, score);
    }

    Ok(())
}
