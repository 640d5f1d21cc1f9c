//! Declarative route-cache table and its compiled matcher + dispatcher.
//!
//! A [`RouteTable`] lists path templates (`admin/{id}`) with the methods whose responses are
//! cache-relevant, plus ally templates whose cache effects land on their primary's entry. The
//! table is compiled once into a [`RouteMatcher`]; [`CacheDispatcher`] turns a match into read,
//! refill, or invalidate actions against the injected cache store.

pub mod dispatcher;
pub mod matcher;
pub mod pattern;

pub use dispatcher::*;
pub use matcher::*;
pub use pattern::*;

// std
use std::{collections::BTreeSet, marker::PhantomData};
// crates.io
use serde::{
	Deserializer, Serializer,
	de::{MapAccess, Visitor},
	ser::SerializeMap,
};
// self
use crate::{_prelude::*, http::Method};

/// Set of methods a template is cache-eligible for.
pub type MethodSet = BTreeSet<Method>;

/// A template and the methods it applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteRule {
	/// Path template, e.g. `admin/{id}`.
	pub template: String,
	/// Cache-eligible methods.
	pub methods: MethodSet,
}
impl RouteRule {
	/// Creates a rule from a template and its methods.
	pub fn new(template: impl Into<String>, methods: impl IntoIterator<Item = Method>) -> Self {
		Self { template: template.into(), methods: methods.into_iter().collect() }
	}
}

/// Ally templates declared for one primary template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllyGroup {
	/// Primary template the allies redirect to.
	pub primary: String,
	/// Ally templates, in declaration order.
	pub allies: Vec<RouteRule>,
}

/// Declarative route-cache table.
///
/// Serialized as `{ "rules": { template: [methods] }, "allies": { primary: { ally: [methods] } } }`;
/// declaration order is preserved because the first matching template wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteTable {
	/// Primary rules, in match order.
	pub rules: Vec<RouteRule>,
	/// Ally groups keyed by primary template.
	pub allies: Vec<AllyGroup>,
}
impl RouteTable {
	/// Creates an empty table; every request bypasses the cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a primary rule.
	pub fn rule(mut self, template: impl Into<String>, methods: impl IntoIterator<Item = Method>) -> Self {
		self.rules.push(RouteRule::new(template, methods));

		self
	}

	/// Appends an ally for `primary`.
	pub fn ally(
		mut self,
		primary: impl Into<String>,
		template: impl Into<String>,
		methods: impl IntoIterator<Item = Method>,
	) -> Self {
		let primary = primary.into();
		let rule = RouteRule::new(template, methods);

		match self.allies.iter_mut().find(|group| group.primary == primary) {
			Some(group) => group.allies.push(rule),
			None => self.allies.push(AllyGroup { primary, allies: vec![rule] }),
		}

		self
	}

	/// Returns `true` when no rules are declared.
	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}
}
impl Serialize for RouteTable {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let rules = OrderedMap(
			self.rules.iter().map(|rule| (rule.template.clone(), rule.methods.clone())).collect(),
		);
		let allies = OrderedMap(
			self.allies
				.iter()
				.map(|group| {
					let inner = OrderedMap(
						group
							.allies
							.iter()
							.map(|rule| (rule.template.clone(), rule.methods.clone()))
							.collect(),
					);

					(group.primary.clone(), inner)
				})
				.collect(),
		);
		let mut map = serializer.serialize_map(Some(2))?;

		map.serialize_entry("rules", &rules)?;
		map.serialize_entry("allies", &allies)?;
		map.end()
	}
}
impl<'de> Deserialize<'de> for RouteTable {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(deny_unknown_fields)]
		struct Raw {
			#[serde(default)]
			rules: OrderedMap<MethodSet>,
			#[serde(default)]
			allies: OrderedMap<OrderedMap<MethodSet>>,
		}

		let raw = Raw::deserialize(deserializer)?;
		let rules = raw
			.rules
			.0
			.into_iter()
			.map(|(template, methods)| RouteRule { template, methods })
			.collect();
		let allies = raw
			.allies
			.0
			.into_iter()
			.map(|(primary, inner)| AllyGroup {
				primary,
				allies: inner
					.0
					.into_iter()
					.map(|(template, methods)| RouteRule { template, methods })
					.collect(),
			})
			.collect();

		Ok(Self { rules, allies })
	}
}

/// JSON object kept in document order.
struct OrderedMap<V>(Vec<(String, V)>);
impl<V> Default for OrderedMap<V> {
	fn default() -> Self {
		Self(Vec::new())
	}
}
impl<V> Serialize for OrderedMap<V>
where
	V: Serialize,
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.0.len()))?;

		for (key, value) in &self.0 {
			map.serialize_entry(key, value)?;
		}

		map.end()
	}
}
impl<'de, V> Deserialize<'de> for OrderedMap<V>
where
	V: Deserialize<'de>,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct OrderedVisitor<V>(PhantomData<V>);
		impl<'de, V> Visitor<'de> for OrderedVisitor<V>
		where
			V: Deserialize<'de>,
		{
			type Value = OrderedMap<V>;

			fn expecting(&self, f: &mut Formatter) -> FmtResult {
				f.write_str("a map keyed by route template")
			}

			fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
			where
				A: MapAccess<'de>,
			{
				let mut entries = Vec::with_capacity(access.size_hint().unwrap_or_default());

				while let Some(entry) = access.next_entry::<String, V>()? {
					entries.push(entry);
				}

				Ok(OrderedMap(entries))
			}
		}

		deserializer.deserialize_map(OrderedVisitor(PhantomData))
	}
}
