//! The two accumulation surfaces and their parity-driven roles.
//!
//! Frame `f` writes surface `f mod 2` and reads the other one, which holds
//! frame `f - 1`. Roles are a pure function of the frame number, so there
//! is no swap state to get out of sync with the frame counter. Index 0 is
//! surface A and index 1 is surface B: after `n` frames the latest image is
//! in A when `n` is odd and in B when `n` is even.

/// Read/write surface indices for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roles {
    pub read: usize,
    pub write: usize,
}

/// Roles for `frame`. `read + write == 1` always holds.
pub fn roles_for_frame(frame: u64) -> Roles {
    let write = (frame % 2) as usize;
    Roles {
        read: 1 - write,
        write,
    }
}

/// A pair of equally sized surfaces alternating between read and write.
#[derive(Debug, Clone)]
pub struct PingPongSurfaces<S> {
    surfaces: [S; 2],
    size: u32,
}

impl<S: Copy> PingPongSurfaces<S> {
    pub fn new(a: S, b: S, size: u32) -> Self {
        Self {
            surfaces: [a, b],
            size,
        }
    }

    /// Surface A (index 0).
    pub fn a(&self) -> S {
        self.surfaces[0]
    }

    /// Surface B (index 1).
    pub fn b(&self) -> S {
        self.surfaces[1]
    }

    /// Side length shared by both surfaces.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The surface `frame` reads from (the one written by `frame - 1`).
    pub fn read(&self, frame: u64) -> S {
        self.surfaces[roles_for_frame(frame).read]
    }

    /// The surface `frame` writes into.
    pub fn write(&self, frame: u64) -> S {
        self.surfaces[roles_for_frame(frame).write]
    }

    /// Both surfaces in `[A, B]` order.
    pub fn both(&self) -> [S; 2] {
        self.surfaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_zero_writes_a_and_reads_b() {
        let pp = PingPongSurfaces::new('A', 'B', 512);
        assert_eq!(pp.write(0), 'A');
        assert_eq!(pp.read(0), 'B');
    }

    #[test]
    fn roles_swap_every_frame() {
        let pp = PingPongSurfaces::new('A', 'B', 512);
        for f in 0..10 {
            assert_eq!(pp.write(f), pp.read(f + 1), "frame {f}");
            assert_ne!(pp.read(f), pp.write(f));
        }
    }

    #[test]
    fn read_plus_write_is_one_for_many_frames() {
        for f in 0..1_000 {
            let r = roles_for_frame(f);
            assert_eq!(r.read + r.write, 1, "invariant broken at frame {f}");
        }
    }

    #[test]
    fn latest_after_n_frames_is_a_when_odd_b_when_even() {
        let pp = PingPongSurfaces::new('A', 'B', 512);
        for n in 1..20u64 {
            let latest = pp.write(n - 1);
            let expected = if n % 2 == 1 { 'A' } else { 'B' };
            assert_eq!(latest, expected, "after {n} frames");
        }
    }

    #[test]
    fn accessors_expose_pair_and_size() {
        let pp = PingPongSurfaces::new(3u8, 4u8, 256);
        assert_eq!(pp.a(), 3);
        assert_eq!(pp.b(), 4);
        assert_eq!(pp.both(), [3, 4]);
        assert_eq!(pp.size(), 256);
    }
}
