use crate::errors::ChatLoopResult;

pub async fn read_text() -> ChatLoopResult<String> {
    tokio::task::spawn_blocking(|| -> ChatLoopResult<String> {
        let mut clipboard = arboard::Clipboard::new()?;
        match clipboard.get_text() {
            Ok(text) => Ok(text),
            // Nothing (or only an image) on the clipboard reads as blank text.
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    })
    .await?
}

pub async fn write_text(text: &str) -> ChatLoopResult<()> {
    let text = text.to_string();
    tokio::task::spawn_blocking(move || -> ChatLoopResult<()> {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text)?;
        Ok(())
    })
    .await?
}

pub async fn clear() -> ChatLoopResult<()> {
    tokio::task::spawn_blocking(|| -> ChatLoopResult<()> {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.clear()?;
        Ok(())
    })
    .await?
}
