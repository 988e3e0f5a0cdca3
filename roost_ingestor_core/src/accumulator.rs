use roost_document_store::Document;

use crate::writer::BatchWriter;

/// Buffers documents in arrival order and flushes them through the writer.
pub struct BatchAccumulator {
    writer: BatchWriter,
    buffer: Vec<Document>,
    flush_count: usize,
}

impl BatchAccumulator {
    pub fn new(writer: BatchWriter) -> Self {
        let buffer = Vec::with_capacity(writer.flush_threshold());
        Self {
            writer,
            buffer,
            flush_count: 0,
        }
    }

    /// Appends the document, flushing if the buffer reached the threshold.
    pub async fn offer(&mut self, document: Document) {
        self.buffer.push(document);

        if self.buffer.len() >= self.writer.flush_threshold() {
            self.flush(false).await;
        }
    }

    /// Flushes whatever is buffered.
    pub async fn finalize(&mut self) {
        self.flush(true).await;
    }

    /// Hands the buffer to the writer and keeps the residue it returns.
    pub async fn flush(&mut self, force: bool) {
        let batch = std::mem::take(&mut self.buffer);
        let reaches_writer =
            !batch.is_empty() && (force || batch.len() >= self.writer.flush_threshold());

        self.buffer = self.writer.write(batch, force).await;

        if reaches_writer {
            self.flush_count += 1;
        }
    }

    /// Number of buffered documents.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of flushes that handed a batch to the writer.
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }
}
