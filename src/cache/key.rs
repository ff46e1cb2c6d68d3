//! Cache Key Module
//!
//! Normalizes call arguments into a single hashable key.
//!
//! A call's positional arguments keep their order, keyword arguments are
//! sorted by name, and a lone positional argument of a fast type becomes the
//! key itself. Everything else is folded into a [`HashedSeq`] whose hash is
//! computed once.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{CacheError, Result};

// == Float Bits ==
/// Bit pattern of a float argument.
///
/// `-0.0` is stored as `0.0` so both produce the same key. NaN is accepted
/// here but rejected by [`make_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatBits(u64);

impl FloatBits {
    pub fn new(value: f64) -> Self {
        if value == 0.0 {
            Self(0.0f64.to_bits())
        } else {
            Self(value.to_bits())
        }
    }

    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }

    pub fn is_nan(self) -> bool {
        self.value().is_nan()
    }
}

// == Key Part ==
/// A single hashable argument value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    None,
    Bool(bool),
    /// Every integer width lands here, so `5u8` and `5i64` are the same key.
    Int(i128),
    Float(FloatBits),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<KeyPart>),
}

impl KeyPart {
    /// Returns true for the types that may stand alone as a key.
    pub fn is_fast(&self) -> bool {
        matches!(
            self,
            KeyPart::None | KeyPart::Int(_) | KeyPart::Float(_) | KeyPart::Str(_) | KeyPart::Bytes(_)
        )
    }

    fn validate(&self, position: &dyn fmt::Display) -> Result<()> {
        match self {
            KeyPart::Float(bits) if bits.is_nan() => Err(CacheError::Unhashable(format!(
                "NaN float in {}",
                position
            ))),
            KeyPart::Tuple(items) => items.iter().try_for_each(|item| item.validate(position)),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::None => write!(f, "None"),
            KeyPart::Bool(value) => write!(f, "{}", value),
            KeyPart::Int(value) => write!(f, "{}", value),
            KeyPart::Float(bits) => write!(f, "{:?}", bits.value()),
            KeyPart::Str(value) => write!(f, "{:?}", value),
            KeyPart::Bytes(value) => write!(f, "b\"{}\"", value.escape_ascii()),
            KeyPart::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
        }
    }
}

macro_rules! int_key_part {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for KeyPart {
                fn from(value: $ty) -> Self {
                    KeyPart::Int(value as i128)
                }
            }
        )*
    };
}

int_key_part!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl From<f64> for KeyPart {
    fn from(value: f64) -> Self {
        KeyPart::Float(FloatBits::new(value))
    }
}

impl From<f32> for KeyPart {
    fn from(value: f32) -> Self {
        KeyPart::Float(FloatBits::new(value as f64))
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

impl From<()> for KeyPart {
    fn from(_: ()) -> Self {
        KeyPart::None
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_owned())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> Self {
        KeyPart::Str(value.clone())
    }
}

impl From<Vec<u8>> for KeyPart {
    fn from(value: Vec<u8>) -> Self {
        KeyPart::Bytes(value)
    }
}

impl From<&[u8]> for KeyPart {
    fn from(value: &[u8]) -> Self {
        KeyPart::Bytes(value.to_vec())
    }
}

impl From<Vec<KeyPart>> for KeyPart {
    fn from(value: Vec<KeyPart>) -> Self {
        KeyPart::Tuple(value)
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(value: Option<T>) -> Self {
        value.map_or(KeyPart::None, Into::into)
    }
}

// == Hashed Sequence ==
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Positional(KeyPart),
    Keyword(String, KeyPart),
}

impl Segment {
    fn value(&self) -> &KeyPart {
        match self {
            Segment::Positional(value) | Segment::Keyword(_, value) => value,
        }
    }
}

/// Composite key with its hash computed once at construction.
#[derive(Debug, Clone)]
pub struct HashedSeq {
    segments: Arc<[Segment]>,
    hash: u64,
}

impl HashedSeq {
    fn new(segments: Vec<Segment>) -> Self {
        let mut hasher = DefaultHasher::new();
        segments.hash(&mut hasher);
        Self {
            segments: segments.into(),
            hash: hasher.finish(),
        }
    }

    /// Number of positional and keyword segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl PartialEq for HashedSeq {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.segments == other.segments
    }
}

impl Eq for HashedSeq {}

impl Hash for HashedSeq {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

// == Cache Key ==
/// Normalized, immutable key for one call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A lone positional argument of a fast type.
    Fast(KeyPart),
    Composite(HashedSeq),
}

impl CacheKey {
    /// Returns true if `part` is one of the key's top-level arguments.
    pub fn contains(&self, part: &KeyPart) -> bool {
        match self {
            CacheKey::Fast(value) => value == part,
            CacheKey::Composite(seq) => seq.segments.iter().any(|s| s.value() == part),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Fast(value) => write!(f, "{}", value),
            CacheKey::Composite(seq) => {
                write!(f, "(")?;
                for (i, segment) in seq.segments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match segment {
                        Segment::Positional(value) => write!(f, "{}", value)?,
                        Segment::Keyword(name, value) => write!(f, "{}={}", name, value)?,
                    }
                }
                write!(f, ")")
            }
        }
    }
}

// == Make Key ==
/// Builds the key for a call with the given positional and keyword arguments.
///
/// Keyword order never matters; a repeated keyword keeps its last value.
///
/// # Errors
/// [`CacheError::Unhashable`] if any argument cannot be hashed (NaN floats).
pub fn make_key<I, N>(args: &[KeyPart], kwargs: I) -> Result<CacheKey>
where
    I: IntoIterator<Item = (N, KeyPart)>,
    N: Into<String>,
{
    let kwargs: BTreeMap<String, KeyPart> = kwargs
        .into_iter()
        .map(|(name, value)| (name.into(), value))
        .collect();

    for (i, arg) in args.iter().enumerate() {
        arg.validate(&format_args!("positional argument {}", i))?;
    }
    for (name, value) in &kwargs {
        value.validate(&format_args!("keyword argument `{}`", name))?;
    }

    if kwargs.is_empty() && args.len() == 1 && args[0].is_fast() {
        return Ok(CacheKey::Fast(args[0].clone()));
    }

    let segments = args
        .iter()
        .cloned()
        .map(Segment::Positional)
        .chain(kwargs.into_iter().map(|(name, value)| Segment::Keyword(name, value)))
        .collect();

    Ok(CacheKey::Composite(HashedSeq::new(segments)))
}

fn positional_key(args: &[KeyPart]) -> Result<CacheKey> {
    make_key(args, std::iter::empty::<(String, KeyPart)>())
}

// == Args Builder ==
/// Positional and keyword arguments of one call.
///
/// ```
/// use dynamo_cache::cache::{Args, KeySource};
///
/// let a = Args::new().arg(1).kwarg("x", "a").kwarg("y", 2);
/// let b = Args::new().arg(1).kwarg("y", 2).kwarg("x", "a");
/// assert_eq!(a.cache_key().unwrap(), b.cache_key().unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<KeyPart>,
    keywords: BTreeMap<String, KeyPart>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<KeyPart>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument, replacing an earlier one with the same name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<KeyPart>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[KeyPart] {
        &self.positional
    }

    pub fn keyword(&self, name: &str) -> Option<&KeyPart> {
        self.keywords.get(name)
    }
}

// == Key Source ==
/// Anything that can be normalized into a [`CacheKey`].
pub trait KeySource {
    fn cache_key(&self) -> Result<CacheKey>;
}

impl KeySource for Args {
    fn cache_key(&self) -> Result<CacheKey> {
        make_key(
            &self.positional,
            self.keywords
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        )
    }
}

impl KeySource for CacheKey {
    fn cache_key(&self) -> Result<CacheKey> {
        Ok(self.clone())
    }
}

impl KeySource for KeyPart {
    fn cache_key(&self) -> Result<CacheKey> {
        positional_key(std::slice::from_ref(self))
    }
}

impl KeySource for str {
    fn cache_key(&self) -> Result<CacheKey> {
        positional_key(&[KeyPart::from(self)])
    }
}

impl<T: KeySource + ?Sized> KeySource for &T {
    fn cache_key(&self) -> Result<CacheKey> {
        (**self).cache_key()
    }
}

impl<T: Clone + Into<KeyPart>> KeySource for Option<T> {
    fn cache_key(&self) -> Result<CacheKey> {
        positional_key(&[KeyPart::from(self.clone())])
    }
}

macro_rules! scalar_key_source {
    ($($ty:ty),*) => {
        $(
            impl KeySource for $ty {
                fn cache_key(&self) -> Result<CacheKey> {
                    positional_key(&[KeyPart::from(self.clone())])
                }
            }
        )*
    };
}

scalar_key_source!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize, f32, f64, bool, (), String, Vec<u8>
);

macro_rules! tuple_key_source {
    ($($name:ident),+) => {
        impl<$($name),+> KeySource for ($($name,)+)
        where
            $($name: Clone + Into<KeyPart>),+
        {
            #[allow(non_snake_case)]
            fn cache_key(&self) -> Result<CacheKey> {
                let ($($name,)+) = self.clone();
                positional_key(&[$($name.into()),+])
            }
        }
    };
}

tuple_key_source!(A);
tuple_key_source!(A, B);
tuple_key_source!(A, B, C);
tuple_key_source!(A, B, C, D);
