//! Chunks of mixed segments and the tokens that encode them.

use canonset_common::Result;
use canonset_format::FormatSpec;
use itertools::Itertools;

/// Representation chosen for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkToken {
    /// Low popcount: the combinadic rank of the chunk's bit pattern.
    Enumerated { rank: u64 },
    /// High popcount: the bits verbatim.
    Raw,
}

/// A fixed-width slice of a mixed segment.
///
/// Bit 0 of `bits` is the lowest identifier of the chunk; bits at and above
/// `width` are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chunk {
    bits: u64,
    width: u8,
    popcount: u8,
    token: ChunkToken,
}

impl Chunk {
    /// Classifies a chunk: popcount up to the format's enumeration ceiling gives an
    /// enumerated token, anything denser a raw one.
    pub fn classify(bits: u64, width: u32, format: &FormatSpec) -> Result<Chunk> {
        let popcount = bits.count_ones();
        let token = if format.is_enumerable(popcount) {
            ChunkToken::Enumerated {
                rank: canonset_combinadic::rank(bits, width, popcount)?,
            }
        } else {
            ChunkToken::Raw
        };
        Ok(Chunk {
            bits,
            width: width as u8,
            popcount: popcount as u8,
            token,
        })
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn popcount(&self) -> u32 {
        self.popcount as u32
    }

    pub fn token(&self) -> ChunkToken {
        self.token
    }

    pub(crate) fn key(&self) -> TokenKey {
        match self.token {
            ChunkToken::Enumerated { rank } => TokenKey::Enumerated {
                popcount: self.popcount(),
                rank,
            },
            ChunkToken::Raw => TokenKey::Raw,
        }
    }
}

/// What two neighbouring chunks must share to be coalesced into one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKey {
    Enumerated { popcount: u32, rank: u64 },
    Raw,
}

/// One wire token, covering `repeat` consecutive chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Enumerated { popcount: u32, rank: u64, repeat: u64 },
    Raw { repeat: u64 },
}

impl Token {
    pub fn repeat(&self) -> u64 {
        match *self {
            Token::Enumerated { repeat, .. } | Token::Raw { repeat } => repeat,
        }
    }
}

/// Groups chunks into tokens. Consecutive raw chunks always form one token, and so
/// do consecutive enumerated chunks with the same popcount and rank.
pub fn coalesce(chunks: &[Chunk]) -> Vec<Token> {
    chunks
        .iter()
        .map(Chunk::key)
        .dedup_with_count()
        .map(|(count, key)| match key {
            TokenKey::Enumerated { popcount, rank } => Token::Enumerated {
                popcount,
                rank,
                repeat: count as u64,
            },
            TokenKey::Raw => Token::Raw {
                repeat: count as u64,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use canonset_format::FORMAT_0;

    use super::*;

    #[test]
    fn test_classify_boundary() {
        let sparse = Chunk::classify((1 << 18) - 1, 64, &FORMAT_0).unwrap();
        assert_eq!(sparse.token(), ChunkToken::Enumerated { rank: 0 });
        assert_eq!(sparse.popcount(), 18);

        let dense = Chunk::classify((1 << 19) - 1, 64, &FORMAT_0).unwrap();
        assert_eq!(dense.token(), ChunkToken::Raw);
        assert_eq!(dense.popcount(), 19);
    }

    #[test]
    fn test_empty_chunk_is_enumerated() {
        let chunk = Chunk::classify(0, 64, &FORMAT_0).unwrap();
        assert_eq!(chunk.token(), ChunkToken::Enumerated { rank: 0 });
    }

    #[test]
    fn test_coalesce() {
        let raw_a = Chunk::classify(u64::MAX, 64, &FORMAT_0).unwrap();
        let raw_b = Chunk::classify(u64::MAX >> 1, 64, &FORMAT_0).unwrap();
        let one = Chunk::classify(1, 64, &FORMAT_0).unwrap();
        let two = Chunk::classify(2, 64, &FORMAT_0).unwrap();
        let tail = Chunk::classify(1, 6, &FORMAT_0).unwrap();

        let tokens = coalesce(&[raw_a, raw_b, one, one, two, raw_a, one, tail]);
        assert_eq!(
            tokens,
            vec![
                Token::Raw { repeat: 2 },
                Token::Enumerated {
                    popcount: 1,
                    rank: 0,
                    repeat: 2
                },
                Token::Enumerated {
                    popcount: 1,
                    rank: 1,
                    repeat: 1
                },
                Token::Raw { repeat: 1 },
                // Same pattern in a narrower final chunk still coalesces.
                Token::Enumerated {
                    popcount: 1,
                    rank: 0,
                    repeat: 2
                },
            ]
        );
        let covered: u64 = tokens.iter().map(Token::repeat).sum();
        assert_eq!(covered, 8);
    }
}
