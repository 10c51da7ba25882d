use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{
    DomainError,
    models::{Device, DeviceId, Holder, HolderId, LocationId, NestId, TechNest, TechNestLocation},
    repository::{Repository, Transaction, UnitOfWork},
};

#[derive(Debug, Clone)]
struct NestRow {
    name: String,
    holder_id: HolderId,
    location_id: LocationId,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    holders: BTreeMap<HolderId, Holder>,
    locations: BTreeMap<LocationId, TechNestLocation>,
    nests: BTreeMap<NestId, NestRow>,
    devices: BTreeMap<DeviceId, Device>,
}

impl Tables {
    fn merge(&mut self, other: Tables) {
        self.holders.extend(other.holders);
        self.locations.extend(other.locations);
        self.nests.extend(other.nests);
        self.devices.extend(other.devices);
    }

    fn holder_by_inn(&self, inn: &str) -> Option<&Holder> {
        self.holders.values().find(|holder| holder.inn == inn)
    }
}

/// Committed rows overlaid with the rows one transaction staged. Ids are
/// allocated from one counter, so the two sides never share a key.
struct View<'a> {
    committed: &'a Tables,
    staged: &'a Tables,
}

impl View<'_> {
    fn holder(&self, id: HolderId) -> Option<&Holder> {
        self.staged
            .holders
            .get(&id)
            .or_else(|| self.committed.holders.get(&id))
    }

    fn inn_taken(&self, inn: &str) -> bool {
        self.staged.holder_by_inn(inn).is_some() || self.committed.holder_by_inn(inn).is_some()
    }

    fn location_at(&self, place: &TechNestLocation) -> Option<LocationId> {
        self.committed
            .locations
            .iter()
            .chain(&self.staged.locations)
            .find(|(_, location)| location.same_place(place))
            .map(|(id, _)| *id)
    }

    fn devices(&self, nest: NestId) -> Vec<Device> {
        let mut devices: Vec<Device> = self
            .committed
            .devices
            .values()
            .chain(self.staged.devices.values())
            .filter(|device| device.nest_id == nest)
            .cloned()
            .collect();
        devices.sort_by_key(|device| device.id);
        devices
    }

    fn nest(&self, id: NestId) -> Option<TechNest> {
        let row = self
            .staged
            .nests
            .get(&id)
            .or_else(|| self.committed.nests.get(&id))?;
        let location = self
            .staged
            .locations
            .get(&row.location_id)
            .or_else(|| self.committed.locations.get(&row.location_id))?
            .clone();

        Some(TechNest {
            id: Some(id),
            name: row.name.clone(),
            devices: self.devices(id),
            holder_id: row.holder_id,
            location,
        })
    }

    fn nests_by_holder(&self, holder: HolderId) -> Vec<TechNest> {
        let mut ids: Vec<NestId> = self
            .committed
            .nests
            .iter()
            .chain(&self.staged.nests)
            .filter(|(_, row)| row.holder_id == holder)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids.into_iter().filter_map(|id| self.nest(id)).collect()
    }
}

fn duplicate(field: &str) -> anyhow::Error {
    DomainError::AlreadyExists {
        message: "Entity already exists".to_owned(),
        path: vec![field.to_owned()],
    }
    .into()
}

#[derive(Debug, Default)]
struct Shared {
    tables: Mutex<Tables>,
    next_id: AtomicU64,
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
}

impl Shared {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Process-local store. Every transaction stages its writes and applies
/// them on commit; reads see committed rows plus the transaction's own.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUnitOfWork {
    shared: Arc<Shared>,
}

impl InMemoryUnitOfWork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transactions opened so far.
    #[cfg(test)]
    pub fn begun(&self) -> usize {
        self.shared.begun.load(Ordering::SeqCst)
    }

    /// Transactions committed so far.
    #[cfg(test)]
    pub fn committed(&self) -> usize {
        self.shared.committed.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn rolled_back(&self) -> usize {
        self.shared.rolled_back.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn begin(&self) -> anyhow::Result<Box<dyn Transaction>> {
        self.shared.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryTransaction {
            shared: Arc::clone(&self.shared),
            staged: Tables::default(),
        }))
    }
}

struct InMemoryTransaction {
    shared: Arc<Shared>,
    staged: Tables,
}

impl InMemoryTransaction {
    /// Runs `f` under the store lock. `f` must not await.
    fn read<T>(&self, f: impl FnOnce(View<'_>) -> T) -> T {
        let committed = self.shared.tables();
        f(View {
            committed: &committed,
            staged: &self.staged,
        })
    }
}

#[async_trait]
impl Repository for InMemoryTransaction {
    async fn add_holder(&mut self, mut holder: Holder) -> anyhow::Result<HolderId> {
        if self.read(|view| view.inn_taken(&holder.inn)) {
            return Err(duplicate("inn"));
        }

        let id = self.shared.allocate();
        holder.id = Some(id);
        self.staged.holders.insert(id, holder);
        Ok(id)
    }

    async fn get_holder(&self, id: HolderId) -> anyhow::Result<Option<Holder>> {
        Ok(self.read(|view| view.holder(id).cloned()))
    }

    async fn add_nest(&mut self, nest: TechNest) -> anyhow::Result<NestId> {
        let existing = self.read(|view| view.location_at(&nest.location));

        let location_id = match existing {
            Some(id) => id,
            None => {
                let id = self.shared.allocate();
                let mut location = nest.location;
                location.id = Some(id);
                self.staged.locations.insert(id, location);
                id
            }
        };

        let id = self.shared.allocate();
        self.staged.nests.insert(
            id,
            NestRow {
                name: nest.name,
                holder_id: nest.holder_id,
                location_id,
            },
        );
        Ok(id)
    }

    async fn get_nest(&self, id: NestId) -> anyhow::Result<Option<TechNest>> {
        Ok(self.read(|view| view.nest(id)))
    }

    async fn get_nests_by_holder(&self, holder: HolderId) -> anyhow::Result<Vec<TechNest>> {
        Ok(self.read(|view| view.nests_by_holder(holder)))
    }

    async fn add_device(&mut self, mut device: Device) -> anyhow::Result<DeviceId> {
        let id = self.shared.allocate();
        device.id = Some(id);
        self.staged.devices.insert(id, device);
        Ok(id)
    }

    async fn get_devices(&self, nest: NestId) -> anyhow::Result<Vec<Device>> {
        Ok(self.read(|view| view.devices(nest)))
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    fn repository(&mut self) -> &mut dyn Repository {
        self
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let Self { shared, staged } = *self;
        let mut tables = shared.tables();
        // Another transaction may have taken the INN since this one read it.
        for holder in staged.holders.values() {
            if tables.holder_by_inn(&holder.inn).is_some() {
                return Err(duplicate("inn"));
            }
        }

        tables.merge(staged);
        drop(tables);
        shared.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        debug!(
            holders = self.staged.holders.len(),
            nests = self.staged.nests.len(),
            devices = self.staged.devices.len(),
            "transaction rolled back"
        );
        self.shared.rolled_back.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
