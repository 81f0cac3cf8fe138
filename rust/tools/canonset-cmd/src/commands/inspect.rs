//! Inspect command implementation

use anyhow::{Context, Result};
use canonset::{
    DecodedSet,
    codec::{ChunkToken, PartitionRef, SegmentRef, Token, tokens::coalesce},
    format::SegmentKind,
};
use serde::Serialize;

use crate::commands::decode_hex;

#[derive(Serialize)]
struct InspectSummary {
    format_version: u64,
    encoded_bytes: usize,
    cardinality: u64,
    partition_count: usize,
    segment_count: usize,
    chunk_count: usize,
    partitions: Vec<PartitionInfo>,
}

#[derive(Serialize)]
struct PartitionInfo {
    id: u32,
    base: u64,
    cardinality: u64,
    segment_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    segments: Vec<SegmentInfo>,
}

#[derive(Serialize)]
struct SegmentInfo {
    start: u64,
    len: u64,
    kind: &'static str,
    cardinality: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_count: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tokens: Vec<TokenInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    chunks: Vec<ChunkInfo>,
}

#[derive(Serialize)]
struct TokenInfo {
    #[serde(rename = "type")]
    token_type: &'static str,
    repeat: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    popcount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rank: Option<u64>,
}

#[derive(Serialize)]
struct ChunkInfo {
    index: usize,
    width: u32,
    popcount: u32,
    bits: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rank: Option<u64>,
}

/// Run the inspect command
pub fn run(verbose: u8, hex: String) -> Result<()> {
    let (bytes, set) = decode_hex(&hex)?;
    let summary = create_summary(&set, bytes.len(), verbose);
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
    println!("{json}");
    Ok(())
}

fn create_summary(set: &DecodedSet, encoded_bytes: usize, verbose: u8) -> InspectSummary {
    InspectSummary {
        format_version: set.format().version,
        encoded_bytes,
        cardinality: set.cardinality(),
        partition_count: set.partition_count(),
        segment_count: set.segment_count(),
        chunk_count: set.chunk_count(),
        partitions: set
            .partitions()
            .map(|p| create_partition_info(&p, verbose))
            .collect(),
    }
}

fn create_partition_info(partition: &PartitionRef<'_>, verbose: u8) -> PartitionInfo {
    let segments = if verbose > 0 {
        partition
            .segments()
            .map(|s| create_segment_info(&s, verbose))
            .collect()
    } else {
        Vec::new()
    };
    PartitionInfo {
        id: partition.id(),
        base: partition.base(),
        cardinality: partition.cardinality(),
        segment_count: partition.segment_count(),
        segments,
    }
}

fn create_segment_info(segment: &SegmentRef<'_>, verbose: u8) -> SegmentInfo {
    let (kind, token_count) = match segment.kind() {
        SegmentKind::Uniform => ("uniform", None),
        SegmentKind::Mixed => ("mixed", Some(coalesce(segment.chunks()).len())),
    };
    let mut info = SegmentInfo {
        start: segment.start(),
        len: segment.len(),
        kind,
        cardinality: segment.cardinality(),
        token_count,
        tokens: Vec::new(),
        chunks: Vec::new(),
    };
    if verbose > 1 {
        info.tokens = coalesce(segment.chunks())
            .into_iter()
            .map(create_token_info)
            .collect();
        info.chunks = segment
            .chunks()
            .iter()
            .enumerate()
            .map(|(index, chunk)| ChunkInfo {
                index,
                width: chunk.width(),
                popcount: chunk.popcount(),
                bits: format!("{:#018x}", chunk.bits()),
                rank: match chunk.token() {
                    ChunkToken::Enumerated { rank } => Some(rank),
                    ChunkToken::Raw => None,
                },
            })
            .collect();
    }
    info
}

fn create_token_info(token: Token) -> TokenInfo {
    match token {
        Token::Enumerated {
            popcount,
            rank,
            repeat,
        } => TokenInfo {
            token_type: "enumerated",
            repeat,
            popcount: Some(popcount),
            rank: Some(rank),
        },
        Token::Raw { repeat } => TokenInfo {
            token_type: if repeat > 1 { "raw_run" } else { "raw" },
            repeat,
            popcount: None,
            rank: None,
        },
    }
}
