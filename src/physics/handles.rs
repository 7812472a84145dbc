/// Host-side identifier of a bone. The simulation never interprets the value, it only hands it back to the host.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BoneHandle(pub u32);

impl BoneHandle {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for BoneHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "BoneHandle<{}>", self.0)
    }
}
