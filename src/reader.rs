//! Bounded line-chunk reader for large `.jsonlines` files.
//!
//! Pulls at most one chunk of lines into memory at a time so a
//! multi-gigabyte file never has to fit in RAM. Blank lines are dropped
//! here and never reach the deserializer, but every read line counts
//! toward the chunk boundary, so a blank-heavy window yields a chunk
//! smaller than the limit rather than shifting where chunks split.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

/// Default maximum lines per chunk. One chunk is also the unit of
/// transactional commit downstream.
pub const DEFAULT_CHUNK_LINES: usize = 200_000;

/// Streams a text source as a sequence of bounded chunks of non-empty lines.
/// Consumes the source; not restartable.
pub struct LineChunker<R> {
    lines: Lines<R>,
    chunk_lines: usize,
}

impl<R: AsyncBufRead + Unpin> LineChunker<R> {
    pub fn new(reader: R, chunk_lines: usize) -> Self {
        Self {
            lines: reader.lines(),
            chunk_lines: chunk_lines.max(1),
        }
    }

    /// Read the next chunk. Every line read counts against the limit,
    /// blank or not; only non-empty lines are returned. A window that was
    /// all blanks is skipped, never emitted as an empty chunk. Returns
    /// `None` once the source is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<String>>> {
        loop {
            let mut chunk = Vec::new();
            let mut read = 0;
            while read < self.chunk_lines {
                match self.lines.next_line().await? {
                    Some(line) => {
                        read += 1;
                        if !line.is_empty() {
                            chunk.push(line);
                        }
                    }
                    None => {
                        if chunk.is_empty() {
                            return Ok(None);
                        }
                        return Ok(Some(chunk));
                    }
                }
            }
            if !chunk.is_empty() {
                return Ok(Some(chunk));
            }
        }
    }
}

/// Open a file as a [`LineChunker`].
pub async fn open_file(
    path: &std::path::Path,
    chunk_lines: usize,
) -> Result<LineChunker<BufReader<tokio::fs::File>>> {
    let file = tokio::fs::File::open(path).await?;
    Ok(LineChunker::new(BufReader::new(file), chunk_lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect_chunks(input: &str, chunk_lines: usize) -> Vec<Vec<String>> {
        let mut chunker = LineChunker::new(input.as_bytes(), chunk_lines);
        let mut chunks = Vec::new();
        while let Some(chunk) = chunker.next_chunk().await.unwrap() {
            chunks.push(chunk);
        }
        chunks
    }

    #[tokio::test]
    async fn test_single_chunk_under_limit() {
        let chunks = collect_chunks("a\nb\nc\n", 10).await;
        assert_eq!(chunks, vec![vec!["a", "b", "c"]]);
    }

    #[tokio::test]
    async fn test_splits_at_chunk_boundary() {
        let chunks = collect_chunks("1\n2\n3\n4\n5\n", 2).await;
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], vec!["1", "2"]);
        assert_eq!(chunks[1], vec!["3", "4"]);
        assert_eq!(chunks[2], vec!["5"]);
    }

    #[tokio::test]
    async fn test_blank_lines_dropped() {
        let chunks = collect_chunks("a\n\n\nb\n\nc\n", 10).await;
        assert_eq!(chunks, vec![vec!["a", "b", "c"]]);
    }

    #[tokio::test]
    async fn test_blank_lines_count_toward_chunk_boundary() {
        // window of 3 reads "a", blank, "b"; "c" lands in the next chunk
        let chunks = collect_chunks("a\n\nb\nc\n", 3).await;
        assert_eq!(chunks, vec![vec!["a", "b"], vec!["c"]]);
    }

    #[tokio::test]
    async fn test_all_blank_window_skipped_not_emitted() {
        let chunks = collect_chunks("\n\n\nx\n", 3).await;
        assert_eq!(chunks, vec![vec!["x"]]);
    }

    #[tokio::test]
    async fn test_empty_source_yields_no_chunks() {
        assert!(collect_chunks("", 10).await.is_empty());
        assert!(collect_chunks("\n\n\n", 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_order_preserved_across_chunks() {
        let input: String = (0..25).map(|i| format!("{}\n", i)).collect();
        let chunks = collect_chunks(&input, 7).await;
        let flat: Vec<String> = chunks.into_iter().flatten().collect();
        let expected: Vec<String> = (0..25).map(|i| i.to_string()).collect();
        assert_eq!(flat, expected);
    }
}
