//! Challenge solver capability.

use async_trait::async_trait;

use crate::Result;

/// Solves the login verification challenge.
///
/// The portal intermittently gates the credential form behind an image
/// challenge. Implementations turn the raw image bytes into the expected
/// answer text; how (OCR, a human, an external service) is entirely up to
/// them.
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    /// Produce the answer text for a challenge image.
    async fn solve(&self, image: &[u8]) -> Result<String>;
}

/// Solver that always answers with the empty string.
///
/// Valid for accounts the portal never challenges.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSolver;

#[async_trait]
impl ChallengeSolver for NoopSolver {
    async fn solve(&self, _image: &[u8]) -> Result<String> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_solver_answers_empty() {
        let answer = NoopSolver.solve(b"not really an image").await.unwrap();
        assert_eq!(answer, "");
    }
}
