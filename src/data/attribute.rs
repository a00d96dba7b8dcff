//! Type-erased per-element attributes that follow their owner's edits.
//!
//! An attribute is a flat array with one value per element of some owner
//! (points of a [`PointSet`](super::point_set::PointSet), facets or corners
//! of a surface, cells of a volume...). The client holds the strong handle;
//! the owner keeps a [`Weak`] reference in an [`AttributeRegistry`] and walks
//! it on every size change, so the array is resized or compacted in lockstep
//! with the mesh. Dropping the last strong handle detaches the attribute;
//! the dead weak entry is pruned on the owner's next pass.
//!
//! Element types are erased behind [`AttributeContainer`]. Typed access goes
//! through [`GenericAttribute`], which downcasts on every call and panics if
//! the stored type differs from the requested one.
//!
//! # Index maps
//! Compaction takes an `old2new` map with one entry per current element:
//! `Some(j)` moves the value at old slot `i` to new slot `j`, `None` drops
//! it. The result holds as many elements as there are `Some` entries, and
//! no two entries may name the same slot.

use std::any::{Any, type_name};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, Index, IndexMut};
use std::rc::{Rc, Weak};

use super::attribute_kind::AttributeKind;
use crate::mesh_error::MeshError;

/// Resizable, compactable array of an erased element type.
pub trait AttributeContainer: Any {
    /// Number of stored elements.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow with default values or truncate. Never relocates data.
    fn resize(&mut self, new_len: usize);

    /// Relocate surviving values per `old2new`, then shrink.
    fn compress(&mut self, old2new: &[Option<usize>]);

    /// Rust name of the element type.
    fn type_name(&self) -> &'static str;

    /// Exchange-format tag of the element type, if it has one.
    fn kind(&self) -> Option<AttributeKind>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared, type-erased attribute array.
pub type SharedContainer = Rc<RefCell<dyn AttributeContainer>>;

/// Attribute name paired with its data, as exchanged with readers/writers.
pub type NamedAttribute = (String, SharedContainer);

/// Wrap a container into a [`SharedContainer`].
pub fn shared<C: AttributeContainer>(container: C) -> SharedContainer {
    Rc::new(RefCell::new(container))
}

/// `Vec`-backed attribute array.
#[derive(Default)]
pub struct AttributeStore<T> {
    data: Vec<T>,
}

impl<T: fmt::Debug> fmt::Debug for AttributeStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeStore")
            .field("len", &self.data.len())
            .field("data", &self.data)
            .finish()
    }
}

impl<T: Default> AttributeStore<T> {
    /// `len` default values.
    pub fn new(len: usize) -> Self {
        let mut data = Vec::with_capacity(len);
        data.resize_with(len, T::default);
        Self { data }
    }
}

impl<T> AttributeStore<T> {
    pub fn with_value(len: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self {
            data: vec![value; len],
        }
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> Index<usize> for AttributeStore<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T> IndexMut<usize> for AttributeStore<T> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }
}

impl<T: Default + 'static> AttributeContainer for AttributeStore<T> {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn resize(&mut self, new_len: usize) {
        self.data.resize_with(new_len, T::default);
    }

    fn compress(&mut self, old2new: &[Option<usize>]) {
        compress_vec(&mut self.data, old2new);
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn kind(&self) -> Option<AttributeKind> {
        AttributeKind::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Apply an `old2new` map to a plain vector.
///
/// # Panics
/// If the map length differs from `data.len()`, if a target is out of the
/// kept range, or if two entries collide.
pub(crate) fn compress_vec<T>(data: &mut Vec<T>, old2new: &[Option<usize>]) {
    assert_eq!(
        old2new.len(),
        data.len(),
        "compress: map has {} entries for {} elements",
        old2new.len(),
        data.len()
    );
    let kept = old2new.iter().flatten().count();
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(kept).collect();
    for (value, target) in data.drain(..).zip(old2new) {
        if let Some(j) = *target {
            assert!(j < kept, "compress: target {j} out of range (kept {kept})");
            assert!(slots[j].is_none(), "compress: two elements map to slot {j}");
            slots[j] = Some(value);
        }
    }
    *data = slots.into_iter().flatten().collect();
}

/// Rank map of a deletion mask: survivors keep their relative order.
///
/// `to_kill[i] == true` maps `i` to `None`; the others map to their rank
/// among the survivors.
pub fn compaction_map(to_kill: &[bool]) -> Vec<Option<usize>> {
    let mut next = 0;
    to_kill
        .iter()
        .map(|&kill| {
            if kill {
                None
            } else {
                next += 1;
                Some(next - 1)
            }
        })
        .collect()
}

/// Map equivalent to compressing with `first`, then with `second`.
pub fn compose_maps(first: &[Option<usize>], second: &[Option<usize>]) -> Vec<Option<usize>> {
    first.iter().map(|m| m.and_then(|j| second[j])).collect()
}

fn downcast<T: 'static>(c: &dyn AttributeContainer) -> &AttributeStore<T> {
    let stored = c.type_name();
    c.as_any()
        .downcast_ref::<AttributeStore<T>>()
        .unwrap_or_else(|| type_mismatch::<T>(stored))
}

fn downcast_mut<T: 'static>(c: &mut dyn AttributeContainer) -> &mut AttributeStore<T> {
    let stored = c.type_name();
    c.as_any_mut()
        .downcast_mut::<AttributeStore<T>>()
        .unwrap_or_else(|| type_mismatch::<T>(stored))
}

fn type_mismatch<T>(stored: &'static str) -> ! {
    panic!(
        "{}",
        MeshError::AttributeTypeMismatch {
            stored,
            requested: type_name::<T>(),
        }
    )
}

/// Typed handle over a shared attribute array.
///
/// Clones share the same data. Not tied to any owner by itself: use the
/// category handles ([`PointAttribute`], [`FacetAttribute`]...) or
/// [`AttributeOwner::attach`] to make an owner keep it in sync.
pub struct GenericAttribute<T> {
    container: SharedContainer,
    _marker: PhantomData<T>,
}

impl<T> Clone for GenericAttribute<T> {
    fn clone(&self) -> Self {
        Self {
            container: Rc::clone(&self.container),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for GenericAttribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericAttribute")
            .field("type", &type_name::<T>())
            .field("len", &self.container.borrow().len())
            .finish()
    }
}

impl<T: Clone + Default + 'static> GenericAttribute<T> {
    /// Unattached attribute of `len` default values.
    pub fn new(len: usize) -> Self {
        Self::wrap(shared(AttributeStore::<T>::new(len)))
    }

    pub fn with_value(len: usize, value: T) -> Self {
        Self::wrap(shared(AttributeStore::with_value(len, value)))
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Self::wrap(shared(AttributeStore::from_vec(data)))
    }

    /// Typed view of an erased container, checked once up front.
    pub fn try_from_container(container: SharedContainer) -> Result<Self, MeshError> {
        let matches = container.borrow().as_any().is::<AttributeStore<T>>();
        if matches {
            Ok(Self::wrap(container))
        } else {
            let stored = container.borrow().type_name();
            Err(MeshError::AttributeTypeMismatch {
                stored,
                requested: type_name::<T>(),
            })
        }
    }

    /// Like [`GenericAttribute::try_from_container`], panicking on mismatch.
    pub fn from_container(container: SharedContainer) -> Self {
        match Self::try_from_container(container) {
            Ok(attr) => attr,
            Err(e) => panic!("{e}"),
        }
    }

    fn wrap(container: SharedContainer) -> Self {
        Self {
            container,
            _marker: PhantomData,
        }
    }

    /// Erased container, e.g. to hand to a writer.
    pub fn container(&self) -> &SharedContainer {
        &self.container
    }

    pub fn len(&self) -> usize {
        self.container.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> T {
        downcast::<T>(&*self.container.borrow())[i].clone()
    }

    pub fn set(&self, i: usize, value: T) {
        downcast_mut::<T>(&mut *self.container.borrow_mut())[i] = value;
    }

    pub fn fill(&self, value: T) {
        downcast_mut::<T>(&mut *self.container.borrow_mut())
            .as_mut_slice()
            .fill(value);
    }

    /// Read view of the whole array.
    ///
    /// Owners cannot resize or compact the attribute while the view lives;
    /// doing so panics with a borrow error.
    pub fn borrow(&self) -> Ref<'_, [T]> {
        Ref::map(self.container.borrow(), |c| downcast::<T>(c).as_slice())
    }

    pub fn borrow_mut(&self) -> RefMut<'_, [T]> {
        RefMut::map(self.container.borrow_mut(), |c| {
            downcast_mut::<T>(c).as_mut_slice()
        })
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.borrow().to_vec()
    }

    /// `(name, container)` pair for attribute lists handed to writers.
    pub fn named(&self, name: &str) -> NamedAttribute {
        (name.to_owned(), Rc::clone(&self.container))
    }
}

/// Typed view of the attribute called `name` in `list`.
pub fn find_named<T: Clone + Default + 'static>(
    list: &[NamedAttribute],
    name: &str,
) -> Result<GenericAttribute<T>, MeshError> {
    let (_, container) = list
        .iter()
        .find(|(n, _)| n == name)
        .ok_or_else(|| MeshError::MissingAttribute(name.to_owned()))?;
    GenericAttribute::try_from_container(Rc::clone(container))
}

/// Remove and return the container called `name` from `list`.
pub fn take_named(list: &mut Vec<NamedAttribute>, name: &str) -> Option<SharedContainer> {
    let i = list.iter().position(|(n, _)| n == name)?;
    Some(list.remove(i).1)
}

/// Weak back-references from an owner to its attributes.
#[derive(Default)]
pub struct AttributeRegistry {
    handles: RefCell<Vec<Weak<RefCell<dyn AttributeContainer>>>>,
}

impl fmt::Debug for AttributeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `container`. The registry never keeps it alive.
    ///
    /// Registering a container that is already tracked does nothing, so each
    /// array is resized or compressed once per edit.
    pub fn register(&self, container: &SharedContainer) {
        let handle = Rc::downgrade(container);
        let mut handles = self.handles.borrow_mut();
        handles.retain(|w| w.strong_count() > 0);
        if !handles.iter().any(|w| Weak::ptr_eq(w, &handle)) {
            handles.push(handle);
        }
    }

    /// Strong handles to every live attribute, pruning dead entries.
    pub fn live(&self) -> Vec<SharedContainer> {
        let mut handles = self.handles.borrow_mut();
        handles.retain(|w| w.strong_count() > 0);
        handles.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn live_count(&self) -> usize {
        self.handles
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Resize every live attribute to `new_len`.
    pub fn resize(&self, new_len: usize) {
        for c in self.live() {
            c.borrow_mut().resize(new_len);
        }
    }

    /// Compact every live attribute with `old2new`.
    pub fn compress(&self, old2new: &[Option<usize>]) {
        for c in self.live() {
            c.borrow_mut().compress(old2new);
        }
    }

    /// First live attribute whose length differs from `expected`.
    pub fn check_lengths(&self, registry: &'static str, expected: usize) -> Result<(), MeshError> {
        for c in self.live() {
            let found = c.borrow().len();
            if found != expected {
                return Err(MeshError::AttributeLengthMismatch {
                    registry,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}

/// Element categories an attribute can be attached to.
pub mod category {
    /// Vertices of a point set.
    #[derive(Debug)]
    pub enum Points {}
    /// Segments of a polyline.
    #[derive(Debug)]
    pub enum Edges {}
    /// Facets of a surface.
    #[derive(Debug)]
    pub enum Facets {}
    /// Facet corners of a surface.
    #[derive(Debug)]
    pub enum Corners {}
    /// Cells of a volume.
    #[derive(Debug)]
    pub enum Cells {}
    /// Half-facets (cell facets) of a volume.
    #[derive(Debug)]
    pub enum CellFacets {}
    /// Cell corners of a volume.
    #[derive(Debug)]
    pub enum CellCorners {}
}

/// Container that keeps attributes of category `C` in sync.
pub trait AttributeOwner<C> {
    /// Registry walked on every size change of the category.
    fn registry(&self) -> &AttributeRegistry;

    /// Current element count of the category.
    fn element_count(&self) -> usize;

    /// Register an existing container, which must already have the right size.
    fn attach(&self, name: &str, container: &SharedContainer) -> Result<(), MeshError> {
        let found = container.borrow().len();
        let expected = self.element_count();
        if found != expected {
            return Err(MeshError::AttributeSizeMismatch {
                name: name.to_owned(),
                expected,
                found,
            });
        }
        self.registry().register(container);
        Ok(())
    }
}

/// Typed attribute registered with an owner of category `C`.
pub struct Attribute<C, T> {
    inner: GenericAttribute<T>,
    _category: PhantomData<fn() -> C>,
}

/// Per-vertex attribute.
pub type PointAttribute<T> = Attribute<category::Points, T>;
/// Per-segment attribute of a polyline.
pub type EdgeAttribute<T> = Attribute<category::Edges, T>;
/// Per-facet attribute of a surface.
pub type FacetAttribute<T> = Attribute<category::Facets, T>;
/// Per-corner attribute of a surface.
pub type CornerAttribute<T> = Attribute<category::Corners, T>;
/// Per-cell attribute of a volume.
pub type CellAttribute<T> = Attribute<category::Cells, T>;
/// Per-half-facet attribute of a volume.
pub type CellFacetAttribute<T> = Attribute<category::CellFacets, T>;
/// Per-cell-corner attribute of a volume.
pub type CellCornerAttribute<T> = Attribute<category::CellCorners, T>;

impl<C, T: Clone + Default + 'static> Attribute<C, T> {
    /// Default-filled attribute sized to and registered with `owner`.
    pub fn new<O: AttributeOwner<C> + ?Sized>(owner: &O) -> Self {
        Self::with_value(owner, T::default())
    }

    pub fn with_value<O: AttributeOwner<C> + ?Sized>(owner: &O, value: T) -> Self {
        let inner = GenericAttribute::with_value(owner.element_count(), value);
        owner.registry().register(inner.container());
        Self {
            inner,
            _category: PhantomData,
        }
    }

    pub fn generic(&self) -> &GenericAttribute<T> {
        &self.inner
    }

    pub fn into_generic(self) -> GenericAttribute<T> {
        self.inner
    }
}

impl<C, T> Deref for Attribute<C, T> {
    type Target = GenericAttribute<T>;

    fn deref(&self) -> &GenericAttribute<T> {
        &self.inner
    }
}

impl<C, T> Clone for Attribute<C, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _category: PhantomData,
        }
    }
}

impl<C, T> fmt::Debug for Attribute<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_grows_with_defaults_and_truncates() {
        let a = GenericAttribute::from_vec(vec![1, 2, 3]);
        a.container().borrow_mut().resize(5);
        assert_eq!(a.to_vec(), vec![1, 2, 3, 0, 0]);
        a.container().borrow_mut().resize(2);
        assert_eq!(a.to_vec(), vec![1, 2]);
    }

    #[test]
    fn compress_moves_and_drops() {
        let a = GenericAttribute::from_vec(vec!['a', 'b', 'c', 'd']);
        a.container()
            .borrow_mut()
            .compress(&[Some(1), None, Some(0), None]);
        assert_eq!(a.to_vec(), vec!['c', 'a']);
    }

    #[test]
    #[should_panic(expected = "two elements map to slot")]
    fn compress_rejects_collisions() {
        let mut v = vec![1, 2];
        compress_vec(&mut v, &[Some(0), Some(0)]);
    }

    #[test]
    #[should_panic(expected = "map has 1 entries for 2 elements")]
    fn compress_rejects_short_maps() {
        let mut v = vec![1, 2];
        compress_vec(&mut v, &[Some(0)]);
    }

    #[test]
    fn compaction_map_ranks_survivors() {
        let m = compaction_map(&[false, true, false, false, true]);
        assert_eq!(m, vec![Some(0), None, Some(1), Some(2), None]);
    }

    #[test]
    fn typed_access_round_trip() {
        let a = GenericAttribute::<f64>::new(3);
        a.set(1, 2.5);
        a.borrow_mut()[2] = -1.0;
        assert_eq!(a.get(1), 2.5);
        assert_eq!(&*a.borrow(), &[0.0, 2.5, -1.0]);
        a.fill(7.0);
        assert_eq!(a.to_vec(), vec![7.0; 3]);
    }

    #[test]
    fn try_from_container_checks_type() {
        let c = shared(AttributeStore::<i32>::new(2));
        assert!(GenericAttribute::<i32>::try_from_container(c.clone()).is_ok());
        let err = GenericAttribute::<f64>::try_from_container(c).unwrap_err();
        assert!(matches!(
            err,
            MeshError::AttributeTypeMismatch {
                stored: "i32",
                requested: "f64"
            }
        ));
    }

    #[test]
    #[should_panic(expected = "attribute type mismatch")]
    fn from_container_panics_on_mismatch() {
        let c = shared(AttributeStore::<bool>::new(1));
        let _ = GenericAttribute::<u8>::from_container(c);
    }

    #[test]
    fn registry_prunes_dropped_attributes() {
        let reg = AttributeRegistry::new();
        let kept = GenericAttribute::<i32>::new(2);
        reg.register(kept.container());
        {
            let temp = GenericAttribute::<f64>::new(2);
            reg.register(temp.container());
            assert_eq!(reg.live_count(), 2);
        }
        assert_eq!(reg.live_count(), 1);
        reg.resize(4);
        assert_eq!(kept.len(), 4);
        assert_eq!(reg.live().len(), 1);
        assert!(reg.check_lengths("test", 4).is_ok());
        assert!(reg.check_lengths("test", 3).is_err());
    }

    #[test]
    fn registering_twice_tracks_once() {
        let reg = AttributeRegistry::new();
        let a = GenericAttribute::from_vec(vec![1, 2, 3]);
        reg.register(a.container());
        reg.register(a.clone().container());
        assert_eq!(reg.live_count(), 1);
        reg.compress(&[None, Some(0), Some(1)]);
        assert_eq!(a.to_vec(), vec![2, 3]);
    }

    #[test]
    fn clones_share_data() {
        let a = GenericAttribute::<i32>::new(1);
        let b = a.clone();
        b.set(0, 9);
        assert_eq!(a.get(0), 9);
    }
}
