//! Batch input and the narrow per-call context the gate writes into

use crate::{DestinationTag, Iteration, Kmer, ValidationError};

/// An ordered set of candidate kmers submitted together for one iteration.
///
/// All kmers in a batch have the same length. Order is preserved and
/// duplicates are allowed; the gate decides what to do with repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    kmers: Vec<Kmer>,
    iteration: Iteration,
    destination: DestinationTag,
}

impl Batch {
    pub fn new(
        kmers: Vec<Kmer>,
        iteration: Iteration,
        destination: DestinationTag,
    ) -> Result<Self, ValidationError> {
        if let Some(first) = kmers.first() {
            let expected = first.len();
            if let Some(odd) = kmers.iter().find(|k| k.len() != expected) {
                return Err(ValidationError::LengthMismatch {
                    kmer: odd.to_string(),
                    expected,
                    got: odd.len(),
                });
            }
        }
        Ok(Self {
            kmers,
            iteration,
            destination,
        })
    }

    /// Parse and validate raw sequences into a batch.
    pub fn parse<I, S>(
        sequences: I,
        iteration: Iteration,
        destination: DestinationTag,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kmers = sequences
            .into_iter()
            .map(Kmer::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(kmers, iteration, destination)
    }

    /// Reject the batch if its kmers are not `expected` long.
    pub fn check_length(&self, expected: usize) -> Result<(), ValidationError> {
        match self.kmers.first() {
            Some(first) if first.len() != expected => Err(ValidationError::LengthMismatch {
                kmer: first.to_string(),
                expected,
                got: first.len(),
            }),
            _ => Ok(()),
        }
    }

    pub fn kmers(&self) -> &[Kmer] {
        &self.kmers
    }

    pub fn iteration(&self) -> Iteration {
        self.iteration
    }

    pub fn destination(&self) -> DestinationTag {
        self.destination
    }

    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }
}

/// The three in-memory collections that receive decoded cache hits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationBuckets {
    pub alignment: Vec<String>,
    pub scrambled: Vec<String>,
    pub enumerated: Vec<String>,
}

impl DestinationBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bucket(&self, tag: DestinationTag) -> &[String] {
        match tag {
            DestinationTag::Alignment => &self.alignment,
            DestinationTag::Scrambled => &self.scrambled,
            DestinationTag::Enumerated => &self.enumerated,
        }
    }

    pub fn bucket_mut(&mut self, tag: DestinationTag) -> &mut Vec<String> {
        match tag {
            DestinationTag::Alignment => &mut self.alignment,
            DestinationTag::Scrambled => &mut self.scrambled,
            DestinationTag::Enumerated => &mut self.enumerated,
        }
    }

    /// Total payloads across all three buckets.
    pub fn total_len(&self) -> usize {
        self.alignment.len() + self.scrambled.len() + self.enumerated.len()
    }
}

/// Everything one cache call is allowed to touch besides the store itself.
#[derive(Debug)]
pub struct GateContext<'a> {
    /// Raise per-call progress logging from debug to info.
    pub verbose: bool,
    pub buckets: &'a mut DestinationBuckets,
    /// Kmers that need out-of-band computation, in staging order.
    pub needs_computation: &'a mut Vec<Kmer>,
}

impl<'a> GateContext<'a> {
    pub fn new(buckets: &'a mut DestinationBuckets, needs_computation: &'a mut Vec<Kmer>) -> Self {
        Self {
            verbose: false,
            buckets,
            needs_computation,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
