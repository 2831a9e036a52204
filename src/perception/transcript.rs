use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::{ChatLoopError, ChatLoopResult};
use crate::perception::traits::CaptureAdapter;
use crate::perception::types::Region;

/// Reads chats from `slot_<index>.txt` files instead of the screen.
/// Lets a run be rehearsed without moving the mouse.
pub struct TranscriptCapture {
    dir: PathBuf,
}

impl TranscriptCapture {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, slot: usize) -> PathBuf {
        transcript_path(&self.dir, slot)
    }
}

fn transcript_path(dir: &Path, slot: usize) -> PathBuf {
    dir.join(format!("slot_{slot}.txt"))
}

#[async_trait]
impl CaptureAdapter for TranscriptCapture {
    async fn capture(&self, slot: usize, _region: &Region) -> ChatLoopResult<String> {
        let path = self.path_for(slot);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ChatLoopError::Capture(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::types::Point;

    #[tokio::test]
    async fn reads_per_slot_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("slot_1.txt"), "Hi there!\n").unwrap();
        let capture = TranscriptCapture::new(dir.path());
        let region = Region::new(Point::new(0, 0), Point::new(1, 1));

        assert_eq!(capture.capture(1, &region).await.unwrap(), "Hi there!\n");
        let err = capture.capture(0, &region).await.unwrap_err();
        assert!(matches!(err, ChatLoopError::Capture(_)));
        assert!(err.to_string().contains("slot_0.txt"));
    }
}
