use std::collections::VecDeque;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::cursor::CorpusStream;
use crate::errors::{Result, StreamError};
use crate::files::Token;

/// One skip-gram training batch.
///
/// `centers[k]` and `contexts[k]` form the k-th (center, context) pair. A batch whose
/// construction crossed the end of the corpus is flagged `valid == false` and should be dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub centers: Array1<Token>,
    pub contexts: Array1<Token>,
    pub valid: bool,
}

impl Batch {

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (Token, Token)> + '_ {
        self.centers.iter().copied().zip(self.contexts.iter().copied())
    }

}

/// Fixed capacity sliding buffer, the oldest token is evicted on push when full.
#[derive(Clone, Debug)]
struct Window {
    tokens: VecDeque<Token>,
    span: usize,
}

impl Window {

    fn new(span: usize) -> Window {
        Window { tokens: VecDeque::new(), span }
    }

    fn push(&mut self, token: Token) {
        if self.tokens.len() == self.span {
            self.tokens.pop_front();
        }
        self.tokens.push_back(token);
    }

    fn get(&self, position: usize) -> Token {
        self.tokens[position]
    }

}

/// Turns a corpus stream into fixed-size skip-gram batches.
pub struct SkipGramBatcher {
    stream: CorpusStream,
    rng: StdRng,
}

impl SkipGramBatcher {

    /// A seeded batcher draws the same context positions on every run.
    pub fn new(stream: CorpusStream, seed: Option<u64>) -> SkipGramBatcher {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        SkipGramBatcher { stream, rng }
    }

    /// Validates the arguments and returns the window span, `2 * skip_window + 1`.
    fn check_arguments(batch_size: usize, num_skips: usize, skip_window: usize) -> Result<usize> {

        if num_skips < 1 {
            return Err(StreamError::Argument("num_skips must be at least 1".to_string()));
        }
        let context_slots = skip_window
            .checked_mul(2)
            .ok_or_else(|| StreamError::Argument(format!("skip_window {} is too large", skip_window)))?;
        let span = context_slots
            .checked_add(1)
            .ok_or_else(|| StreamError::Argument(format!("skip_window {} is too large", skip_window)))?;
        if num_skips > context_slots {
            return Err(StreamError::Argument(format!(
                "num_skips {} exceeds the {} context slots of skip_window {}",
                num_skips,
                context_slots,
                skip_window
            )));
        }
        if batch_size % num_skips != 0 {
            return Err(StreamError::Argument(format!(
                "batch_size {} is not a multiple of num_skips {}",
                batch_size, num_skips
            )));
        }
        Ok(span)
    }

    // pulls one token into the window, reporting whether the corpus wrapped
    fn pull(&mut self, window: &mut Window) -> Result<bool> {
        let (token, exhausted) = self.stream.next_token()?;
        window.push(token);
        Ok(exhausted)
    }

    /// Positions of the window used as contexts, distinct and never the center.
    fn context_positions<R: Rng>(rng: &mut R, span: usize, center: usize, num_skips: usize) -> Vec<usize> {
        (0..span)
            .filter(|position| *position != center)
            .choose_multiple(rng, num_skips)
    }

    /// Builds `batch_size` (center, context) pairs from a window of radius `skip_window`.
    ///
    /// Each window position contributes `num_skips` pairs before sliding one token forward.
    pub fn generate(&mut self, batch_size: usize, num_skips: usize, skip_window: usize) -> Result<Batch> {

        // [ skip_window center skip_window ]
        let span = SkipGramBatcher::check_arguments(batch_size, num_skips, skip_window)?;
        let center = skip_window;
        let mut window = Window::new(span);
        let mut valid = true;

        for _ in 0..span {
            if self.pull(&mut window)? {
                valid = false;
            }
        }

        let mut centers = Vec::new();
        let mut contexts = Vec::new();

        for _ in 0..batch_size / num_skips {

            let center_token = window.get(center);
            for position in SkipGramBatcher::context_positions(&mut self.rng, span, center, num_skips) {
                centers.push(center_token);
                contexts.push(window.get(position));
            }

            if self.pull(&mut window)? {
                valid = false;
            }
        }

        if !valid {
            debug!("batch crossed the end of the corpus, marking invalid");
        }

        Ok(Batch {
            centers: Array1::from(centers),
            contexts: Array1::from(contexts),
            valid,
        })
    }

    /// A random run of at most `len` consecutive tokens from the resident block.
    pub fn random_sentence(&mut self, len: usize) -> Vec<Token> {
        let block = self.stream.current_block();
        if block.len() <= len {
            return block.to_vec();
        }
        let start = self.rng.gen_range(0..=block.len() - len);
        block[start..start + len].to_vec()
    }

    pub fn reset(&mut self) -> Result<()> {
        self.stream.reset()
    }

    pub fn stream(&self) -> &CorpusStream {
        &self.stream
    }

}

#[cfg(test)]
mod tests {

    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::SkipGramBatcher;
    use crate::cursor::tests::open_corpus;
    use crate::errors::StreamError;

    fn batcher(blocks: &[&[u32]], seed: u64) -> (tempfile::TempDir, SkipGramBatcher) {
        let (dir, stream) = open_corpus(blocks);
        (dir, SkipGramBatcher::new(stream, Some(seed)))
    }

    #[test]
    fn batch_has_requested_size() {
        let corpus: Vec<u32> = (0..200).collect();
        let (_dir, mut gen) = batcher(&[&corpus[..120], &corpus[120..]], 7);

        for (batch_size, num_skips, skip_window) in [(8, 2, 1), (12, 3, 2), (16, 4, 2), (10, 1, 3), (6, 6, 3)] {
            let batch = gen.generate(batch_size, num_skips, skip_window).unwrap();
            assert_eq!(batch.centers.len(), batch_size);
            assert_eq!(batch.contexts.len(), batch_size);
            assert!(gen.stream().global_index() < gen.stream().total_size());
        }
    }

    #[test]
    fn window_of_three_pairs_center_with_both_neighbours() {
        // A=1 B=2 C=3, the center is B
        let (_dir, mut gen) = batcher(&[&[1, 2, 3, 4, 5, 6]], 3);

        let batch = gen.generate(2, 2, 1).unwrap();
        let mut pairs: Vec<(u32, u32)> = batch.pairs().collect();
        pairs.sort();
        assert_eq!(pairs, vec![(2, 1), (2, 3)]);
        assert!(batch.valid);
    }

    #[test]
    fn centers_slide_one_token_per_window() {
        let corpus: Vec<u32> = (0..50).collect();
        let (_dir, mut gen) = batcher(&[&corpus], 11);

        let batch = gen.generate(12, 2, 2).unwrap();
        let centers: Vec<u32> = batch.centers.to_vec();
        assert_eq!(centers, vec![2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7]);
        for (center, context) in batch.pairs() {
            assert_ne!(center, context);
            assert!(center.abs_diff(context) <= 2);
        }
    }

    #[test]
    fn context_positions_distinct_and_skip_center() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..500 {
            let picks = SkipGramBatcher::context_positions(&mut rng, 7, 3, 4);
            let unique: HashSet<usize> = picks.iter().copied().collect();
            assert_eq!(picks.len(), 4);
            assert_eq!(unique.len(), 4);
            assert!(!unique.contains(&3));
            assert!(picks.iter().all(|p| *p < 7));
        }

        // every non-center slot when num_skips == 2 * skip_window
        let mut all = SkipGramBatcher::context_positions(&mut rng, 5, 2, 4);
        all.sort();
        assert_eq!(all, vec![0, 1, 3, 4]);
    }

    #[test]
    fn reading_past_single_block_invalidates_batch() {
        // N = 4, priming reads positions 0..3 and the first slide reads position 4
        let (_dir, mut gen) = batcher(&[&[1, 2, 3, 4]], 1);

        let batch = gen.generate(2, 2, 1).unwrap();
        assert!(batch.valid);
        assert_eq!(gen.stream().epochs(), 0);

        gen.reset().unwrap();
        let batch = gen.generate(4, 2, 1).unwrap();
        assert_eq!(batch.len(), 4);
        assert!(!batch.valid);
        assert_eq!(gen.stream().epochs(), 1);
    }

    #[test]
    fn rejects_bad_arguments() {
        let (_dir, mut gen) = batcher(&[&[1, 2, 3, 4, 5]], 1);

        let cases = [
            (4, 0, 1),
            (4, 3, 1),
            (5, 2, 1),
            (4, 1, 0),
            (2, 2, 0),
            // 2 * skip_window overflows
            (3, 3, usize::MAX / 2 + 1),
            (usize::MAX, 1, usize::MAX),
        ];
        for (batch_size, num_skips, skip_window) in cases {
            assert!(matches!(
                gen.generate(batch_size, num_skips, skip_window),
                Err(StreamError::Argument(_))
            ));
        }
        // a rejected call does not move the cursor
        assert_eq!(gen.stream().global_index(), 0);
    }

    #[test]
    fn seeded_batchers_agree() {
        let corpus: Vec<u32> = (0..64).collect();
        let (_a, mut first) = batcher(&[&corpus], 42);
        let (_b, mut second) = batcher(&[&corpus], 42);

        for _ in 0..5 {
            assert_eq!(first.generate(8, 2, 2).unwrap(), second.generate(8, 2, 2).unwrap());
        }
    }

    #[test]
    fn random_sentence_within_block() {
        let corpus: Vec<u32> = (100..140).collect();
        let (_dir, mut gen) = batcher(&[&corpus], 9);

        let sentence = gen.random_sentence(20);
        assert_eq!(sentence.len(), 20);
        assert!(sentence.windows(2).all(|w| w[1] == w[0] + 1));
        assert_eq!(gen.random_sentence(100).len(), 40);
    }

}
