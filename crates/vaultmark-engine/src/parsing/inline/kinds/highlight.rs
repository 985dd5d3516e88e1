pub struct Highlight;

impl Highlight {
    pub const MARK: &'static [u8; 2] = b"==";
}
