use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::model::{Question, QuestionBank, QuizSettings, SelectionEntry};

/// Draws the questions of a session and the option order of each one.
///
/// Questions are picked without replacement with a partial Fisher-Yates
/// shuffle over bank indices; multiple-choice options get a full shuffle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampler {
    sample_size: usize,
}

impl Sampler {
    #[must_use]
    pub fn new(sample_size: usize) -> Self {
        Self { sample_size }
    }

    #[must_use]
    pub fn from_settings(settings: &QuizSettings) -> Self {
        Self::new(settings.sample_size())
    }

    #[must_use]
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Draw `min(sample_size, bank.len())` distinct questions using the thread RNG.
    #[must_use]
    pub fn select(&self, bank: &QuestionBank) -> Vec<SelectionEntry> {
        self.select_with(bank, &mut rng())
    }

    /// Same as [`Sampler::select`] with a caller-provided RNG.
    pub fn select_with<R: Rng + ?Sized>(
        &self,
        bank: &QuestionBank,
        rng: &mut R,
    ) -> Vec<SelectionEntry> {
        let questions = bank.questions();
        let amount = self.sample_size.min(questions.len());
        let mut indices: Vec<usize> = (0..questions.len()).collect();
        let (chosen, _) = indices.partial_shuffle(rng, amount);

        chosen
            .iter()
            .map(|&index| entry_for(&questions[index], rng))
            .collect()
    }
}

fn entry_for<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> SelectionEntry {
    if !question.is_multiple_choice() {
        return SelectionEntry::canonical(question.clone());
    }
    let mut order = question.options().to_vec();
    order.shuffle(rng);
    SelectionEntry::new(question.clone(), Some(order))
        .unwrap_or_else(|_| SelectionEntry::canonical(question.clone()))
}
