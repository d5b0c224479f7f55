//! Fixtura – test-fixture provisioning for automated tests.
//!
//! Fixtura resolves named, file-backed *library items* (parameterized SQL
//! scripts, plus JSON/XML/text fixtures), expands the macro syntax inside
//! them, routes the resolved script fragments to the correct backing
//! database connection, queues them, executes them, and returns the result
//! rows as loosely-typed records.
//!
//! ## Modules
//! * [`library`] – [`library::LibraryItem`] (lazy file-backed text) and the
//!   key → item [`library::Catalog`].
//! * [`replacement`] – the [`replacement::ReplacementValue`] literal kinds,
//!   case-normalized [`replacement::ReplacementSet`]s, and the
//!   [`replacement::SqlValue`] cell type returned from execution.
//! * [`expand`] – the macro-expansion engine: `DEFAULTS` extraction,
//!   placeholder substitution, and recursive `INCLUDE` resolution.
//! * [`queue`] – [`queue::SqlLibrary`]: connection registry, per-alias
//!   script queue, and `GO`-batched execution producing
//!   [`queue::ResultRow`]s.
//! * [`registry`] – the [`registry::ItemDictionary`] trait, the simple
//!   JSON/XML/text dictionaries, and extension registration rules.
//! * [`manager`] – [`manager::TestDataManager`], the explicit context object
//!   wiring settings, dictionaries and discovered files together.
//!
//! ## Fixture syntax
//! ```text
//! DEFAULTS: { baseValue: 1, label: 'Boom' }
//! --DbType = WORKSPACE
//! Select {baseValue}, name, '{label}' from sys.databases
//! INCLUDE Other.Item, {baseValue: 69}
//! ```
//! `DEFAULTS` supplies fallback values and is stripped from the output;
//! `{name}` placeholders are case-insensitive; `INCLUDE` pulls in another
//! item, optionally fanned out over a list of override objects; a
//! `--DbType = ALIAS` marker starts the region destined for that connection
//! alias; a line containing only `GO` separates execution batches.
//!
//! ## Quick Start
//! ```
//! use fixtura::library::LibraryItem;
//! use fixtura::queue::SqlLibrary;
//! use fixtura::replacement::ReplacementSet;
//!
//! let mut sql = SqlLibrary::new();
//! sql.catalog_mut().register(LibraryItem::from_text(
//!     "Samples.Pick",
//!     "DEFAULTS: { picked: 1 }\n--DbType = WORKSPACE\nselect {picked} as picked",
//! ));
//! sql.set_connections([("workspace".to_string(), ":memory:".to_string())]);
//! sql.queue_from_catalog("Samples.Pick", &ReplacementSet::new()).unwrap();
//! let rows = sql.execute().unwrap();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].get("picked").unwrap().as_integer(), Some(1));
//! ```
//!
//! ## Status
//! Fixtura is a sequential test helper: everything runs synchronously on the
//! calling thread, and sharing one instance across concurrent tests is
//! unsupported. Errors are written to be read by a human debugging a failing
//! test run and are never retried or suppressed internally.

pub mod error;
pub mod expand;
pub mod library;
pub mod manager;
pub mod queue;
pub mod registry;
pub mod replacement;
