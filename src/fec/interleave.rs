//! Block interleaver/deinterleaver. Write order is row-major; read order
//! walks columns with a per-column starting offset (`col_inc`) and a
//! per-row step (`row_inc`), which is coprime with `rows` in every
//! specified mode so the mapping is a bijection on the block.

use crate::errors::FecError;
use crate::modes::InterleaverParams;

#[derive(Debug, Clone, Copy)]
pub struct BlockInterleaver {
    rows: usize,
    cols: usize,
    row_inc: usize,
    col_inc: usize,
}

impl BlockInterleaver {
    pub fn new(params: &InterleaverParams) -> Self {
        Self {
            rows: params.rows,
            cols: params.cols,
            row_inc: params.row_inc,
            col_inc: params.col_inc,
        }
    }

    pub fn block_size(&self) -> usize {
        self.rows * self.cols
    }

    /// Row-major index supplying the `k`-th element of the read (interleaved)
    /// sequence. `row_inc == 0` marks modes (M2400V, M4800S) with no row
    /// shuffling at all: the mapping is the identity.
    fn read_index(&self, k: usize) -> usize {
        if self.row_inc == 0 {
            return k;
        }
        let col = k / self.rows;
        let i = k % self.rows;
        let row = (col * self.col_inc + i * self.row_inc) % self.rows;
        row * self.cols + col
    }

    fn check_len(&self, len: usize) -> Result<(), FecError> {
        if len != self.block_size() {
            return Err(FecError::BlockSizeMismatch {
                expected: self.block_size(),
                actual: len,
            });
        }
        Ok(())
    }

    /// Interleave one full block of hard bits.
    pub fn interleave(&self, bits: &[u8]) -> Result<Vec<u8>, FecError> {
        self.check_len(bits.len())?;
        Ok((0..bits.len()).map(|k| bits[self.read_index(k)]).collect())
    }

    /// Deinterleave one full block of hard bits.
    pub fn deinterleave(&self, bits: &[u8]) -> Result<Vec<u8>, FecError> {
        self.check_len(bits.len())?;
        let mut out = vec![0u8; bits.len()];
        for k in 0..bits.len() {
            out[self.read_index(k)] = bits[k];
        }
        Ok(out)
    }

    /// Deinterleave soft bits (signed LLRs), preserving sign — the path the
    /// receiver actually uses, since Viterbi consumes soft decisions.
    pub fn deinterleave_soft(&self, soft: &[i8]) -> Result<Vec<i8>, FecError> {
        self.check_len(soft.len())?;
        let mut out = vec![0i8; soft.len()];
        for k in 0..soft.len() {
            out[self.read_index(k)] = soft[k];
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::ModeId;

    #[test]
    fn interleave_deinterleave_is_identity_for_every_mode() {
        for id in ModeId::ALL {
            let params = id.descriptor().interleaver;
            let il = BlockInterleaver::new(&params);
            let n = il.block_size();
            let bits: Vec<u8> = (0..n).map(|i| (i % 2) as u8).collect();
            let interleaved = il.interleave(&bits).unwrap();
            let back = il.deinterleave(&interleaved).unwrap();
            assert_eq!(back, bits, "mode {:?} failed roundtrip", id);
        }
    }

    #[test]
    fn read_index_is_a_bijection_over_the_block() {
        for id in ModeId::ALL {
            let params = id.descriptor().interleaver;
            let il = BlockInterleaver::new(&params);
            let n = il.block_size();
            let mut seen = vec![false; n];
            for k in 0..n {
                let idx = il.read_index(k);
                assert!(!seen[idx], "mode {:?} collided at {}", id, idx);
                seen[idx] = true;
            }
        }
    }

    #[test]
    fn rejects_wrong_length() {
        let params = ModeId::M2400S.descriptor().interleaver;
        let il = BlockInterleaver::new(&params);
        assert!(il.interleave(&[0u8; 3]).is_err());
    }

    #[test]
    fn soft_bit_sign_survives_deinterleave() {
        let params = ModeId::M1200S.descriptor().interleaver;
        let il = BlockInterleaver::new(&params);
        let n = il.block_size();
        let soft: Vec<i8> = (0..n).map(|i| if i % 2 == 0 { 100 } else { -100 }).collect();
        let out = il.deinterleave_soft(&soft).unwrap();
        assert!(out.iter().all(|&v| v == 100 || v == -100));
    }
}
