//! Splitting slide texts into request-sized chunks.
//!
//! Larger chunks mean fewer requests but risk the endpoint's input limit and
//! tend to produce thinner notes per slide.

use std::num::NonZeroUsize;

/// A contiguous run of slide texts sent in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Global 0-based index of the first slide in the chunk.
    pub start: usize,

    /// Slide texts, in order.
    pub slides: &'a [String],
}

impl<'a> Chunk<'a> {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// 1-based number of the first slide, as shown to users.
    pub fn first_slide_number(&self) -> usize {
        self.start + 1
    }

    /// Map a chunk-local 1-based slide number to a global 0-based index.
    ///
    /// Returns `None` when the number does not name a slide of this chunk.
    pub fn global_index(&self, local_number: usize) -> Option<usize> {
        if (1..=self.len()).contains(&local_number) {
            Some(local_number - 1 + self.start)
        } else {
            None
        }
    }

    /// Slide texts paired with their chunk-local 1-based numbers.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        let slides = self.slides;
        slides
            .iter()
            .enumerate()
            .map(|(i, text)| (i + 1, text.as_str()))
    }
}

/// Iterator over the chunks of a slide list.
///
/// A clone continues from the same position; call [`chunk_slides`] again to
/// iterate from the beginning.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    inner: std::slice::Chunks<'a, String>,
    size: usize,
    next_start: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let slides = self.inner.next()?;
        let chunk = Chunk {
            start: self.next_start,
            slides,
        };
        self.next_start += self.size;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Chunks<'_> {}

/// Split `slides` into chunks of at most `size` slides.
pub fn chunk_slides(slides: &[String], size: NonZeroUsize) -> Chunks<'_> {
    Chunks {
        inner: slides.chunks(size.get()),
        size: size.get(),
        next_start: 0,
    }
}
