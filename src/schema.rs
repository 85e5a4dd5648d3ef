//! Record metadata: field discovery, cached keys, typed accessors
//!
//! A [`Record`] lists its fields once through a [`Schema`]. Each field type
//! is classified when the metadata is built, its key is encoded with
//! [`encode_key`], and the result is frozen into an immutable
//! [`TypeMetadata`] that every later write reuses.
//!
//! ```rust
//! use ionbuf::{Record, Schema, TypeMetadata, TypeTag};
//!
//! struct Tick {
//!     symbol: String,
//!     price: f64,
//!     qty: i32,
//! }
//!
//! impl Record for Tick {
//!     fn describe(schema: &mut Schema<'_, Self>) {
//!         schema
//!             .field("symbol", |t| &t.symbol)
//!             .field("price", |t| &t.price)
//!             .field("qty", |t| &t.qty);
//!     }
//! }
//!
//! let metadata = TypeMetadata::<Tick>::build()?;
//! let tags: Vec<_> = metadata.fields().iter().map(|f| f.type_tag()).collect();
//! assert_eq!(tags, [TypeTag::Utf8, TypeTag::Float64, TypeTag::Int64]);
//! # Ok::<(), ionbuf::Error>(())
//! ```

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{type_name, Any, TypeId};
use core::convert::identity;
use core::fmt;

use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::frame;
use crate::key::{encode_key, KeyBytes};
use crate::primitive::{utf8_len, BOOLEAN_LEN, FLOAT32_LEN, FLOAT64_LEN, INT64_LEN};
use crate::tag::LengthClass;

/// A type whose fields can be written as an object
pub trait Record: Sized + 'static {
    /// Declare the fields of `Self`, in wire order
    fn describe(schema: &mut Schema<'_, Self>);
}

/// Wire type of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// UTF-8 string
    Utf8,
    /// Nested record
    Object,
}

type Getter<T, V> = Box<dyn Fn(&T) -> V + Send + Sync>;
type StrGetter<T> = Box<dyn for<'a> Fn(&'a T) -> &'a str + Send + Sync>;

/// Type-erased shared metadata, keyed by the record's `TypeId`
pub(crate) type Erased = Arc<dyn Any + Send + Sync>;

/// Value accessor, one variant per wire type
enum Access<T> {
    Bool(Getter<T, bool>),
    Int64(Getter<T, i64>),
    Float32(Getter<T, f32>),
    Float64(Getter<T, f64>),
    Utf8(StrGetter<T>),
    Object(Box<dyn NestedObject<T>>),
}

/// Nested record field, erased over the nested type
trait NestedObject<T>: Send + Sync {
    fn write(&self, instance: &T, encoder: &mut Encoder<'_>, class: LengthClass) -> Result<()>;

    fn encoded_len(&self, instance: &T, class: LengthClass) -> usize;
}

struct Nested<T, C: Record> {
    get: fn(&T) -> &C,
    metadata: Arc<TypeMetadata<C>>,
}

impl<T, C: Record> NestedObject<T> for Nested<T, C> {
    fn write(&self, instance: &T, encoder: &mut Encoder<'_>, class: LengthClass) -> Result<()> {
        self.metadata.write((self.get)(instance), encoder, class)
    }

    fn encoded_len(&self, instance: &T, class: LengthClass) -> usize {
        self.metadata.encoded_len((self.get)(instance), class)
    }
}

/// The getter itself, if `V` is exactly `N`
fn typed<T: 'static, V: Any, N: 'static>(get: fn(&T) -> &V) -> Option<fn(&T) -> &N> {
    let erased: &dyn Any = &get;
    erased.downcast_ref::<fn(&T) -> &N>().copied()
}

fn scalar<T: 'static, V: Any, N: Copy + 'static, W: 'static>(
    get: fn(&T) -> &V,
    convert: fn(N) -> W,
) -> Option<Getter<T, W>> {
    let get = typed::<T, V, N>(get)?;
    Some(Box::new(move |instance: &T| convert(*get(instance))))
}

fn text<T, F>(read: F) -> Access<T>
where
    F: for<'a> Fn(&'a T) -> &'a str + Send + Sync + 'static,
{
    Access::Utf8(Box::new(read))
}

/// Pick the accessor for a field of type `V`
fn classify<T: 'static, V: Any>(field: &'static str, get: fn(&T) -> &V) -> Result<Access<T>> {
    let access = scalar::<T, V, bool, bool>(get, identity)
        .map(Access::Bool)
        .or_else(|| scalar::<T, V, i64, i64>(get, identity).map(Access::Int64))
        .or_else(|| scalar::<T, V, i32, i64>(get, i64::from).map(Access::Int64))
        .or_else(|| scalar::<T, V, i16, i64>(get, i64::from).map(Access::Int64))
        .or_else(|| scalar::<T, V, i8, i64>(get, i64::from).map(Access::Int64))
        .or_else(|| scalar::<T, V, u32, i64>(get, i64::from).map(Access::Int64))
        .or_else(|| scalar::<T, V, u16, i64>(get, i64::from).map(Access::Int64))
        .or_else(|| scalar::<T, V, u8, i64>(get, i64::from).map(Access::Int64))
        .or_else(|| scalar::<T, V, f32, f32>(get, identity).map(Access::Float32))
        .or_else(|| scalar::<T, V, f64, f64>(get, identity).map(Access::Float64))
        .or_else(|| {
            typed::<T, V, String>(get).map(|get| text(move |instance: &T| get(instance).as_str()))
        })
        .or_else(|| {
            typed::<T, V, &'static str>(get).map(|get| text(move |instance: &T| *get(instance)))
        })
        .or_else(|| {
            typed::<T, V, Box<str>>(get).map(|get| text(move |instance: &T| &**get(instance)))
        });

    access.ok_or(Error::UnsupportedFieldType {
        field,
        type_name: type_name::<V>(),
    })
}

/// State carried through one metadata build, nested types included
///
/// Nested metadata built along the way is held here and only handed to the
/// registry once the outermost build has succeeded.
pub(crate) struct BuildContext {
    visiting: Vec<TypeId>,
    built: Vec<(TypeId, Erased)>,
}

impl BuildContext {
    pub(crate) fn new() -> Self {
        Self {
            visiting: Vec::new(),
            built: Vec::new(),
        }
    }

    fn built<C: Record>(&self) -> Option<Arc<TypeMetadata<C>>> {
        let id = TypeId::of::<C>();
        let (_, entry) = self.built.iter().find(|(built, _)| *built == id)?;
        Arc::clone(entry).downcast::<TypeMetadata<C>>().ok()
    }

    /// Nested metadata built during this build, in completion order
    #[cfg_attr(not(feature = "std"), allow(dead_code))]
    pub(crate) fn into_built(self) -> Vec<(TypeId, Erased)> {
        self.built
    }
}

#[cfg(feature = "std")]
fn published<C: Record>() -> Option<Arc<TypeMetadata<C>>> {
    crate::registry::lookup::<C>()
}

#[cfg(not(feature = "std"))]
fn published<C: Record>() -> Option<Arc<TypeMetadata<C>>> {
    None
}

/// Metadata for nested type `C`: already published, built earlier in this
/// build, or built now
fn resolve<C: Record>(cx: &mut BuildContext) -> Result<Arc<TypeMetadata<C>>> {
    if let Some(found) = published::<C>().or_else(|| cx.built::<C>()) {
        return Ok(found);
    }

    let metadata = Arc::new(TypeMetadata::<C>::build_in(cx)?);
    let erased: Erased = metadata.clone();
    cx.built.push((TypeId::of::<C>(), erased));
    Ok(metadata)
}

/// One field of a record: name, cached key and accessor
pub struct FieldDescriptor<T> {
    name: &'static str,
    key: KeyBytes,
    type_name: &'static str,
    access: Access<T>,
}

impl<T> FieldDescriptor<T> {
    /// Declared field name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Pre-encoded key bytes
    #[inline]
    pub fn key(&self) -> &KeyBytes {
        &self.key
    }

    /// Rust type name of the field
    #[inline]
    pub fn rust_type(&self) -> &'static str {
        self.type_name
    }

    /// Wire type of the value
    #[inline]
    pub fn type_tag(&self) -> TypeTag {
        match self.access {
            Access::Bool(_) => TypeTag::Bool,
            Access::Int64(_) => TypeTag::Int64,
            Access::Float32(_) => TypeTag::Float32,
            Access::Float64(_) => TypeTag::Float64,
            Access::Utf8(_) => TypeTag::Utf8,
            Access::Object(_) => TypeTag::Object,
        }
    }

    /// Write this field's value (without its key)
    #[inline]
    fn write_value(&self, instance: &T, encoder: &mut Encoder<'_>, class: LengthClass) -> Result<()> {
        match &self.access {
            Access::Bool(get) => encoder.put_bool(get(instance)),
            Access::Int64(get) => encoder.put_i64(get(instance)),
            Access::Float32(get) => encoder.put_f32(get(instance)),
            Access::Float64(get) => encoder.put_f64(get(instance)),
            Access::Utf8(get) => encoder.put_str(get(instance)),
            Access::Object(nested) => nested.write(instance, encoder, class),
        }
    }

    fn value_len(&self, instance: &T, class: LengthClass) -> usize {
        match &self.access {
            Access::Bool(_) => BOOLEAN_LEN,
            Access::Int64(_) => INT64_LEN,
            Access::Float32(_) => FLOAT32_LEN,
            Access::Float64(_) => FLOAT64_LEN,
            Access::Utf8(get) => utf8_len(get(instance)),
            Access::Object(nested) => nested.encoded_len(instance, class),
        }
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("type_tag", &self.type_tag())
            .field("rust_type", &self.type_name)
            .finish()
    }
}

/// Collects the field declarations of one record type
pub struct Schema<'v, T> {
    fields: Vec<FieldDescriptor<T>>,
    cx: &'v mut BuildContext,
    error: Option<Error>,
}

impl<'v, T: Record> Schema<'v, T> {
    fn new(cx: &'v mut BuildContext) -> Self {
        Self {
            fields: Vec::new(),
            cx,
            error: None,
        }
    }

    /// Declare a scalar field
    ///
    /// Supported types are `bool`, `i64` (and `i8`, `i16`, `i32`, `u8`,
    /// `u16`, `u32`, widened), `f32`, `f64`, `String`, `&'static str` and
    /// `Box<str>`. Any other type makes the metadata build fail with
    /// [`Error::UnsupportedFieldType`].
    pub fn field<V: Any>(&mut self, name: &'static str, get: fn(&T) -> &V) -> &mut Self {
        if self.error.is_none() {
            let access = classify(name, get);
            self.push(name, type_name::<V>(), access);
        }
        self
    }

    /// Declare a nested record field
    ///
    /// The nested type's metadata is resolved right away.
    pub fn object<C: Record>(&mut self, name: &'static str, get: fn(&T) -> &C) -> &mut Self {
        if self.error.is_none() {
            let access = resolve::<C>(self.cx).map(|metadata| {
                let nested: Box<dyn NestedObject<T>> = Box::new(Nested { get, metadata });
                Access::Object(nested)
            });
            self.push(name, type_name::<C>(), access);
        }
        self
    }

    fn push(&mut self, name: &'static str, type_name: &'static str, access: Result<Access<T>>) {
        let descriptor = access.and_then(|access| {
            if self.fields.iter().any(|field| field.name == name) {
                return Err(Error::DuplicateField { field: name });
            }
            Ok(FieldDescriptor {
                name,
                key: encode_key(name)?,
                type_name,
                access,
            })
        });

        match descriptor {
            Ok(descriptor) => self.fields.push(descriptor),
            Err(err) => self.error = Some(err),
        }
    }

    fn finish(self) -> Result<TypeMetadata<T>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(TypeMetadata {
                type_name: type_name::<T>(),
                fields: self.fields,
            }),
        }
    }
}

/// Immutable wire description of a record type
pub struct TypeMetadata<T> {
    type_name: &'static str,
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: Record> TypeMetadata<T> {
    /// Build metadata for `T`, resolving nested record types
    ///
    /// Fails on the first unsupported, duplicate or cyclic field; nothing
    /// is returned for a type whose build failed.
    pub fn build() -> Result<Self> {
        Self::build_in(&mut BuildContext::new())
    }

    pub(crate) fn build_in(cx: &mut BuildContext) -> Result<Self> {
        let id = TypeId::of::<T>();
        if cx.visiting.contains(&id) {
            return Err(Error::CyclicTypeGraph {
                type_name: type_name::<T>(),
            });
        }

        cx.visiting.push(id);
        let result = {
            let mut schema = Schema::new(cx);
            T::describe(&mut schema);
            schema.finish()
        };
        cx.visiting.pop();

        match &result {
            Ok(metadata) => tracing::debug!(
                type_name = metadata.type_name,
                fields = metadata.fields.len(),
                "built type metadata"
            ),
            Err(err) => tracing::debug!(
                type_name = type_name::<T>(),
                error = %err,
                "type metadata build failed"
            ),
        }
        result
    }

    /// `TypeId` of the record, the key it is published under
    #[inline]
    pub fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    /// Write `instance` as an object at the encoder's position
    ///
    /// Nested objects reuse `class` for their own placeholders.
    pub fn write(&self, instance: &T, encoder: &mut Encoder<'_>, class: LengthClass) -> Result<()> {
        let frame = encoder.begin_object(class)?;
        for field in &self.fields {
            encoder.put_key(&field.key)?;
            field.write_value(instance, encoder, class)?;
        }
        encoder.end_object(frame)?;
        Ok(())
    }

    /// Exact number of bytes [`TypeMetadata::write`] produces for `instance`
    pub fn encoded_len(&self, instance: &T, class: LengthClass) -> usize {
        let content: usize = self
            .fields
            .iter()
            .map(|field| field.key.len() + field.value_len(instance, class))
            .sum();
        frame::header_len(class) + content
    }
}

impl<T> TypeMetadata<T> {
    /// Rust type name of the record
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields in declaration order
    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl<T> fmt::Debug for TypeMetadata<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}
