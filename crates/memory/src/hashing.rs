//! Deterministic offline embedder.
//!
//! Feature hashing over lowercase word tokens: each token is SHA-256 hashed,
//! the digest picks a bucket and a sign, and the accumulated vector is
//! L2-normalized. Texts sharing words land close together, which is enough
//! lexical signal to run the agent without an embeddings endpoint.

use async_trait::async_trait;
use heartline_core::error::IndexError;
use heartline_core::exemplar::Embedder;
use sha2::{Digest, Sha256};

pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::cosine_similarity;

    #[test]
    fn deterministic_and_normalized() {
        let e = HashingEmbedder::new(64);
        let a = e.embed_one("I lost my job today");
        let b = e.embed_one("I lost my job today");
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn case_and_punctuation_insensitive() {
        let e = HashingEmbedder::new(64);
        assert_eq!(e.embed_one("Lost my JOB!"), e.embed_one("lost my job"));
    }

    #[test]
    fn shared_words_are_closer() {
        let e = HashingEmbedder::new(256);
        let query = e.embed_one("I am nervous about my exam tomorrow");
        let near = e.embed_one("Context: nervous about the exam | Emotion: anxious");
        let far = e.embed_one("Context: we won the championship game | Emotion: joyful");
        assert!(cosine_similarity(&query, &near) > cosine_similarity(&query, &far));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let e = HashingEmbedder::new(8);
        assert!(e.embed_one("   ").iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn embeds_batches_in_order() {
        let e = HashingEmbedder::new(16);
        let out = e.embed(&["a b".into(), "c".into()]).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], e.embed_one("c"));
    }
}
