//! Values and object storage

use std::fmt;

use crate::ty::TypeId;

/// Handle to an object on a [`Heap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

/// A live value: a primitive or a reference to a heap object
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null reference
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 64-bit unsigned integer
    U64(u64),
    /// String
    Str(String),
    /// Object reference
    Ref(ObjectId),
}

impl Value {
    /// Whether the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Referenced object, if this is a reference
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// Integral value widened to i128, if this is an integer
    pub fn as_integral(&self) -> Option<i128> {
        match self {
            Value::I32(v) => Some(i128::from(*v)),
            Value::I64(v) => Some(i128::from(*v)),
            Value::U64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
            Value::Ref(id) => write!(f, "#{}", id.0),
        }
    }
}

/// Enumerable contents of a collection object
#[derive(Debug, Clone, Default)]
pub struct Elements {
    /// Elements in iteration order
    pub items: Vec<Value>,
    /// The enumerator faults after yielding this many elements
    pub fault_after: Option<usize>,
}

impl Elements {
    /// Elements that enumerate cleanly
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            fault_after: None,
        }
    }

    /// Elements whose enumerator faults after `after` items
    pub fn faulting(items: Vec<Value>, after: usize) -> Self {
        Self {
            items,
            fault_after: Some(after),
        }
    }
}

/// An object on the heap
#[derive(Debug, Clone)]
pub struct HeapObject {
    /// Runtime type
    pub ty: TypeId,
    /// Instance field storage, indexed by field slot
    pub slots: Vec<Value>,
    /// Enumerable contents (collections only)
    pub elements: Option<Elements>,
}

impl HeapObject {
    /// Create an object with `slot_count` null slots
    pub fn new(ty: TypeId, slot_count: usize) -> Self {
        Self {
            ty,
            slots: vec![Value::Null; slot_count],
            elements: None,
        }
    }

    /// Attach enumerable contents
    pub fn with_elements(mut self, elements: Elements) -> Self {
        self.elements = Some(elements);
        self
    }
}

/// Object storage
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    /// Create an empty heap
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an object
    pub fn alloc(&mut self, object: HeapObject) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    /// Get an object
    pub fn get(&self, id: ObjectId) -> Option<&HeapObject> {
        self.objects.get(id.0)
    }

    /// Get an object mutably
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut HeapObject> {
        self.objects.get_mut(id.0)
    }

    /// Number of allocated objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing has been allocated
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
