pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<T> = rustc_hash::FxHashSet<T>;
pub type BTreeMap<K, V> = std::collections::BTreeMap<K, V>;
