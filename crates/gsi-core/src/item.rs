//! A tagged-union payload for heterogeneous buffers.
//!
//! Most buffers store a concrete `T`. [`Item`] is for callers that want a
//! single element type able to carry an object reference, a raw pointer, or
//! a small scalar, with [`KindFilter`] restricting which of those kinds a
//! particular buffer admits.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::ArrayError;
use crate::ownership::Ownership;

/// A value of one of several payload kinds.
#[derive(Clone)]
pub enum Item {
    /// A shared, reference-counted object.
    Object(Rc<dyn Any>),
    /// A raw address. Never dereferenced by the buffer.
    Pointer(*const ()),
    /// Signed scalar.
    Int(i64),
    /// Unsigned scalar.
    UInt(u64),
    /// Floating-point scalar.
    Float(f64),
    /// A character.
    Char(char),
}

/// Discriminant of an [`Item`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ItemKind {
    /// [`Item::Object`].
    Object = 0,
    /// [`Item::Pointer`].
    Pointer = 1,
    /// [`Item::Int`].
    Int = 2,
    /// [`Item::UInt`].
    UInt = 3,
    /// [`Item::Float`].
    Float = 4,
    /// [`Item::Char`].
    Char = 5,
}

impl ItemKind {
    /// All kinds, in discriminant order.
    pub const ALL: [ItemKind; 6] = [
        ItemKind::Object,
        ItemKind::Pointer,
        ItemKind::Int,
        ItemKind::UInt,
        ItemKind::Float,
        ItemKind::Char,
    ];
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Pointer => "pointer",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Float => "float",
            Self::Char => "char",
        };
        f.write_str(name)
    }
}

impl Item {
    /// Wrap `value` as a shared object.
    pub fn object<V: Any>(value: V) -> Self {
        Item::Object(Rc::new(value))
    }

    /// Which payload kind is active.
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Object(_) => ItemKind::Object,
            Item::Pointer(_) => ItemKind::Pointer,
            Item::Int(_) => ItemKind::Int,
            Item::UInt(_) => ItemKind::UInt,
            Item::Float(_) => ItemKind::Float,
            Item::Char(_) => ItemKind::Char,
        }
    }

    /// Borrow the object payload as `V`, if this is an object of that type.
    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        match self {
            Item::Object(obj) => obj.downcast_ref(),
            _ => None,
        }
    }

    /// The signed scalar payload.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Item::Int(v) => Some(v),
            _ => None,
        }
    }

    /// The unsigned scalar payload.
    pub fn as_uint(&self) -> Option<u64> {
        match *self {
            Item::UInt(v) => Some(v),
            _ => None,
        }
    }

    /// The floating-point payload.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Item::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Object(obj) => write!(f, "Object({:p})", Rc::as_ptr(obj)),
            Item::Pointer(p) => write!(f, "Pointer({p:p})"),
            Item::Int(v) => write!(f, "Int({v})"),
            Item::UInt(v) => write!(f, "UInt({v})"),
            Item::Float(v) => write!(f, "Float({v})"),
            Item::Char(c) => write!(f, "Char({c:?})"),
        }
    }
}

/// Objects compare by identity, scalars by value.
impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Item::Object(a), Item::Object(b)) => Rc::ptr_eq(a, b),
            (Item::Pointer(a), Item::Pointer(b)) => a == b,
            (Item::Int(a), Item::Int(b)) => a == b,
            (Item::UInt(a), Item::UInt(b)) => a == b,
            (Item::Float(a), Item::Float(b)) => a == b,
            (Item::Char(a), Item::Char(b)) => a == b,
            _ => false,
        }
    }
}

impl From<i64> for Item {
    fn from(v: i64) -> Self {
        Item::Int(v)
    }
}

impl From<u64> for Item {
    fn from(v: u64) -> Self {
        Item::UInt(v)
    }
}

impl From<f64> for Item {
    fn from(v: f64) -> Self {
        Item::Float(v)
    }
}

impl From<char> for Item {
    fn from(v: char) -> Self {
        Item::Char(v)
    }
}

/// A set of [`ItemKind`]s, stored as a bitmask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemKinds(u8);

impl ItemKinds {
    /// No kinds.
    pub const NONE: ItemKinds = ItemKinds(0);
    /// Every kind.
    pub const ALL: ItemKinds = ItemKinds(0b0011_1111);
    /// The scalar kinds: int, uint, float, char.
    pub const SCALARS: ItemKinds = ItemKinds(0b0011_1100);

    /// The set containing only `kind`.
    pub const fn only(kind: ItemKind) -> Self {
        ItemKinds(1 << kind as u8)
    }

    /// `self` plus `kind`.
    pub const fn with(self, kind: ItemKind) -> Self {
        ItemKinds(self.0 | (1 << kind as u8))
    }

    /// Returns `true` if `kind` is in the set.
    pub const fn contains(self, kind: ItemKind) -> bool {
        self.0 & (1 << kind as u8) != 0
    }
}

impl Default for ItemKinds {
    fn default() -> Self {
        ItemKinds::ALL
    }
}

impl FromIterator<ItemKind> for ItemKinds {
    fn from_iter<I: IntoIterator<Item = ItemKind>>(iter: I) -> Self {
        iter.into_iter().fold(ItemKinds::NONE, ItemKinds::with)
    }
}

/// Ownership policy admitting only the configured [`ItemKinds`].
///
/// Refused items never enter the buffer; acquisition fails with
/// [`ArrayError::HookRefused`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KindFilter {
    permitted: ItemKinds,
}

impl KindFilter {
    /// Admit the kinds in `permitted`.
    pub fn new(permitted: ItemKinds) -> Self {
        Self { permitted }
    }

    /// The admitted kinds.
    pub fn permitted(&self) -> ItemKinds {
        self.permitted
    }
}

impl Ownership<Item> for KindFilter {
    const RELEASE_HOOK: bool = false;

    fn acquire(&self, item: &Item) -> Result<(), ArrayError> {
        let kind = item.kind();
        if self.permitted.contains(kind) {
            Ok(())
        } else {
            Err(ArrayError::HookRefused {
                reason: format!("{kind} items are not permitted"),
            })
        }
    }
}
