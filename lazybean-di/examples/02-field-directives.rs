use lazybean_di::bean::Closeable;
use lazybean_di::context::{BeanPtr, Context, LazyContextBuilder, TypedContext};
use lazybean_di::provider_registry::BeanProvider;
use lazybean_di::{bean_setters, Bean, ErrorPtr};
use std::cell::Cell;

#[derive(Bean)]
#[bean(closeable)]
struct Cache {
    #[bean(tag = "path=cache.size", default = "default_size")]
    size: usize,
    #[bean(tag = "ignore")]
    hits: Cell<u64>,
}

fn default_size() -> usize {
    128
}

// closeable beans are closed together with the container which created them
impl Closeable for Cache {
    fn close(&self) -> Result<(), ErrorPtr> {
        println!("Closing cache after {} hits.", self.hits.get());
        Ok(())
    }
}

#[derive(Bean)]
struct Store {
    name: String,
}

#[derive(Bean)]
#[bean(setters)]
struct Service {
    cache: BeanPtr<Cache>,
    // a specific named bean is requested
    #[bean(tag = "beanName=archive")]
    archive: BeanPtr<Store>,
    // setter-injected fields go through their set_* method
    #[bean(tag = "path=service.retries", setter)]
    retries: u8,
}

#[bean_setters]
impl Service {
    fn set_retries(&mut self, retries: u8) {
        self.retries = retries.min(5);
    }
}

fn main() {
    let context = LazyContextBuilder::new()
        .build()
        .expect("error creating context");

    context.set_value("service.retries", 10u8);
    context
        .register(
            BeanProvider::new::<Store, _>(|_| {
                Ok(Store {
                    name: "archive".to_string(),
                })
            })
            .with_name("archive"),
        )
        .expect("error registering store");

    let service = context
        .get_typed::<Service>()
        .expect("error creating Service");
    service.cache.hits.set(3);

    println!(
        "cache size: {}, store: {}, retries: {}",
        service.cache.size, service.archive.name, service.retries
    );

    context.close().expect("error closing context");
}
