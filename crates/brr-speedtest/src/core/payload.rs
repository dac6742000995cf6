use bytes::Bytes;

/// Size of the random buffer every upload body is cut from.
pub const PAYLOAD_SEED_SIZE: usize = 1_000_000;

/// Largest slice handed to the transport in one piece.
pub const PAYLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Split an upload body of exactly `len` bytes into slices of `seed`.
///
/// Bodies longer than the seed repeat it; shorter ones truncate it. Every
/// chunk is a reference-counted view of `seed`, nothing is copied.
pub fn payload_chunks(seed: &Bytes, len: u64) -> Vec<Bytes> {
    if seed.is_empty() || len == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::with_capacity((len / PAYLOAD_CHUNK_SIZE as u64) as usize + 1);
    let mut remaining = len;
    let mut offset = 0usize;
    while remaining > 0 {
        let take = (seed.len() - offset)
            .min(PAYLOAD_CHUNK_SIZE)
            .min(usize::try_from(remaining).unwrap_or(usize::MAX));
        chunks.push(seed.slice(offset..offset + take));
        remaining -= take as u64;
        offset = (offset + take) % seed.len();
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> Bytes {
        Bytes::from((0..PAYLOAD_SEED_SIZE).map(|i| (i % 251) as u8).collect::<Vec<_>>())
    }

    fn total(chunks: &[Bytes]) -> u64 {
        chunks.iter().map(|c| c.len() as u64).sum()
    }

    #[test]
    fn test_truncates_short_bodies() {
        let seed = seed();
        let chunks = payload_chunks(&seed, 11_000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], seed.slice(..11_000));
    }

    #[test]
    fn test_exact_length_and_chunk_bound() {
        let seed = seed();
        for len in [101_000u64, 1_000_000, 2_500_001] {
            let chunks = payload_chunks(&seed, len);
            assert_eq!(total(&chunks), len);
            assert!(chunks.iter().all(|c| c.len() <= PAYLOAD_CHUNK_SIZE && !c.is_empty()));
        }
    }

    #[test]
    fn test_tiles_past_seed_end() {
        let seed = seed();
        let chunks = payload_chunks(&seed, PAYLOAD_SEED_SIZE as u64 + 10);
        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
        assert_eq!(&joined[..PAYLOAD_SEED_SIZE], &seed[..]);
        assert_eq!(&joined[PAYLOAD_SEED_SIZE..], &seed[..10]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(payload_chunks(&seed(), 0).is_empty());
        assert!(payload_chunks(&Bytes::new(), 100).is_empty());
    }
}
