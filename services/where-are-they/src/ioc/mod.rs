//! Request-scoped service locator.
//!
//! An [`Injector`] maps a type to a provider. Handlers never construct
//! use-cases themselves: the IoC middleware builds one injector per request,
//! binds the shared gateways as instances and the use-cases as providers,
//! and handlers pull what they need with [`Injector::get_instance`].
//!
//! Bindings are keyed by `TypeId`, so a lookup either yields a value of the
//! requested type or a [`ResolveError`] naming it.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Factory stored for a bound type. Receives the injector so it can resolve
/// its own dependencies.
pub type Provider =
    Arc<dyn Fn(&Injector) -> Result<Box<dyn Any + Send>, ResolveError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no binding registered for '{type_name}'")]
    Unbound { type_name: &'static str },

    #[error("provider for '{type_name}' produced a value of another type")]
    TypeMismatch { type_name: &'static str },
}

#[derive(Clone)]
struct Binding {
    type_name: &'static str,
    provider: Provider,
}

#[derive(Clone, Default)]
pub struct Injector {
    bindings: HashMap<TypeId, Binding>,
}

impl Injector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a registration for `T`. Binding a type twice replaces the
    /// earlier provider.
    pub fn bind<T: Send + 'static>(&mut self) -> Binder<'_, T> {
        Binder {
            injector: self,
            marker: PhantomData,
        }
    }

    /// Raw provider lookup.
    pub fn get_provider<T: 'static>(&self) -> Option<Provider> {
        self.bindings
            .get(&TypeId::of::<T>())
            .map(|binding| binding.provider.clone())
    }

    pub fn get_instance<T: 'static>(&self) -> Result<T, ResolveError> {
        let provider = self.get_provider::<T>().ok_or(ResolveError::Unbound {
            type_name: type_name::<T>(),
        })?;

        provider(self)?
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| ResolveError::TypeMismatch {
                type_name: type_name::<T>(),
            })
    }

    pub fn is_bound<T: 'static>(&self) -> bool {
        self.bindings.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Names of every bound type, sorted. Used in startup logging.
    pub fn bound_type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.bindings.values().map(|b| b.type_name).collect();
        names.sort_unstable();
        names
    }

    fn register<T: 'static>(&mut self, provider: Provider) {
        self.bindings.insert(
            TypeId::of::<T>(),
            Binding {
                type_name: type_name::<T>(),
                provider,
            },
        );
    }
}

pub struct Binder<'a, T> {
    injector: &'a mut Injector,
    marker: PhantomData<fn() -> T>,
}

impl<'a, T: Send + 'static> Binder<'a, T> {
    /// Every lookup returns a clone of `value`.
    pub fn to_instance(self, value: T)
    where
        T: Clone + Sync,
    {
        let provider: Provider = Arc::new(move |_: &Injector| {
            Ok(Box::new(value.clone()) as Box<dyn Any + Send>)
        });
        self.injector.register::<T>(provider);
    }

    /// `factory` runs on every lookup.
    pub fn to_provider<F>(self, factory: F)
    where
        F: Fn(&Injector) -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        let provider: Provider = Arc::new(move |injector: &Injector| {
            factory(injector).map(|value| Box::new(value) as Box<dyn Any + Send>)
        });
        self.injector.register::<T>(provider);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, PartialEq)]
    struct Greeting(String);

    struct Greeter {
        greeting: Greeting,
    }

    #[test]
    fn instance_binding_returns_the_captured_value() {
        let mut injector = Injector::new();
        injector.bind::<Greeting>().to_instance(Greeting("hola".into()));

        assert_eq!(injector.get_instance::<Greeting>().unwrap(), Greeting("hola".into()));
        assert_eq!(injector.get_instance::<Greeting>().unwrap(), Greeting("hola".into()));
    }

    #[test]
    fn provider_binding_runs_on_every_lookup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut injector = Injector::new();
        injector.bind::<usize>().to_provider(move |_| {
            Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
        });

        assert_eq!(injector.get_instance::<usize>().unwrap(), 1);
        assert_eq!(injector.get_instance::<usize>().unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn providers_resolve_their_dependencies_from_the_injector() {
        let mut injector = Injector::new();
        injector.bind::<Greeting>().to_instance(Greeting("buen dia".into()));
        injector.bind::<Greeter>().to_provider(|inj| {
            Ok(Greeter {
                greeting: inj.get_instance::<Greeting>()?,
            })
        });

        let greeter = injector.get_instance::<Greeter>().unwrap();
        assert_eq!(greeter.greeting, Greeting("buen dia".into()));
    }

    #[test]
    fn unbound_types_are_reported_by_name() {
        let injector = Injector::new();
        let err = injector.get_instance::<Greeting>().err().unwrap();

        assert!(matches!(err, ResolveError::Unbound { type_name } if type_name.ends_with("Greeting")));
        assert!(injector.get_provider::<Greeting>().is_none());
    }

    #[test]
    fn missing_nested_dependency_propagates() {
        let mut injector = Injector::new();
        injector.bind::<Greeter>().to_provider(|inj| {
            Ok(Greeter {
                greeting: inj.get_instance::<Greeting>()?,
            })
        });

        assert!(injector.is_bound::<Greeter>());
        assert!(matches!(
            injector.get_instance::<Greeter>(),
            Err(ResolveError::Unbound { .. })
        ));
    }

    #[test]
    fn rebinding_replaces_the_provider() {
        let mut injector = Injector::new();
        injector.bind::<Greeting>().to_instance(Greeting("a".into()));
        injector.bind::<Greeting>().to_instance(Greeting("b".into()));

        assert_eq!(injector.len(), 1);
        assert_eq!(injector.get_instance::<Greeting>().unwrap(), Greeting("b".into()));
    }

    #[test]
    fn trait_objects_can_be_bound_behind_arc() {
        trait Named: Send + Sync {
            fn name(&self) -> &str;
        }
        struct Fixed;
        impl Named for Fixed {
            fn name(&self) -> &str {
                "fixed"
            }
        }

        let mut injector = Injector::new();
        injector.bind::<Arc<dyn Named>>().to_instance(Arc::new(Fixed));

        let named = injector.get_instance::<Arc<dyn Named>>().unwrap();
        assert_eq!(named.name(), "fixed");
        assert_eq!(injector.bound_type_names().len(), 1);
    }
}
