
use canonset_bits::BitWriter;
use canonset_format::{CduType, FORMAT_0, TokenTag};

/// Hand assembly of Format 0 streams, for inputs the encoder never produces.
pub(crate) struct StreamBuilder {
    writer: BitWriter,
}

impl StreamBuilder {
    /// Starts an empty stream.
    pub fn raw() -> StreamBuilder {
        StreamBuilder {
            writer: BitWriter::new(),
        }
    }

    /// Starts a stream with the version and partition count.
    pub fn new(partition_count: u64) -> StreamBuilder {
        let mut builder = StreamBuilder::raw();
        builder.cdu(&FORMAT_0.fields.format_version, 0);
        builder.cdu(&FORMAT_0.fields.partition_count, partition_count);
        builder
    }

    pub fn cdu(&mut self, ty: &CduType, value: u64) -> &mut Self {
        ty.write(&mut self.writer, value).unwrap();
        self
    }

    pub fn bits(&mut self, value: u64, width: u32) -> &mut Self {
        self.writer.write(value, width);
        self
    }

    pub fn partition(&mut self, delta: u64, segment_count: u64) -> &mut Self {
        self.cdu(&FORMAT_0.fields.partition_delta, delta)
            .cdu(&FORMAT_0.fields.segment_count, segment_count)
    }

    pub fn segment(&mut self, mixed: bool, start_delta: u64, len: u64) -> &mut Self {
        self.bits(mixed as u64, 1)
            .cdu(&FORMAT_0.fields.start_delta, start_delta)
            .cdu(&FORMAT_0.fields.length, len - 1)
    }

    pub fn tag(&mut self, tag: TokenTag) -> &mut Self {
        self.bits(tag.bits(), 2)
    }

    /// Enumerated token; a `repeat` above 1 sets the run flag.
    pub fn enumerated(&mut self, k: u32, repeat: u64, rank: u64, width: u32) -> &mut Self {
        self.tag(TokenTag::Enumerated);
        if repeat > 1 {
            self.bits(k as u64 | TokenTag::ENUM_RUN_FLAG, 6)
                .cdu(&FORMAT_0.fields.repeat_count, repeat);
        } else {
            self.bits(k as u64, 6);
        }
        self.bits(rank, canonset_combinadic::rank_bits(width, k))
    }

    pub fn finish(&mut self) -> Vec<u8> {
        let mut writer = std::mem::take(&mut self.writer);
        writer.align_to_byte();
        writer.into_bytes()
    }
}
