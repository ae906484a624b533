use lazybean_di::context::{BeanPtr, Context, LazyContextBuilder, TypedContext};
use lazybean_di::func_provider::FuncProviderConfig;
use lazybean_di::provider_registry::BeanProvider;
use lazybean_di::settings::ContainerSettings;
use lazybean_di::{provider, Bean, Error};

#[derive(Bean)]
struct Connection {
    #[bean(tag = "ignore")]
    url: String,
}

// providers registered at compile time are picked up by every container built from settings
#[provider(name = "replica")]
fn replica_connection(context: &dyn Context) -> Result<Connection, Error> {
    let host = context.get_value::<String>("db.replica")?;
    Ok(Connection {
        url: format!("postgres://{host}"),
    })
}

struct Repository {
    connection: BeanPtr<Connection>,
    pool_size: u32,
}

// types without a derive can still be beans, as long as something provides them
impl lazybean_di::bean::Injectable for Repository {
    fn type_class() -> lazybean_di::bean::TypeClass {
        lazybean_di::bean::TypeClass::Struct
    }
}

fn new_repository(connection: BeanPtr<Connection>, pool_size: u32) -> Repository {
    Repository {
        connection,
        pool_size,
    }
}

fn main() {
    let context = LazyContextBuilder::from_settings(&ContainerSettings::default())
        .expect("error reading static providers")
        .build()
        .expect("error creating context");

    context.set_value("db.replica", "replica.local".to_string());

    // a provider built from a closure
    context
        .register(BeanProvider::new::<Connection, _>(|_| {
            Ok(Connection {
                url: "postgres://primary.local".to_string(),
            })
        }))
        .expect("error registering connection");

    // a provider built from a plain function - parameters are resolved from the container, with
    // value paths and defaults configured per position
    context
        .register(BeanProvider::from_fn::<Repository, _, _>(
            new_repository,
            FuncProviderConfig::new()
                .with_value_path_at(1, "db.pool_size")
                .with_default_at(1, 4u32),
        ))
        .expect("error registering repository");

    let repository = context
        .get_typed::<Repository>()
        .expect("error creating Repository");
    println!(
        "{} with {} connections",
        repository.connection.url, repository.pool_size
    );

    let replica = context
        .get_named_typed::<Connection>("replica")
        .expect("error creating replica connection");
    println!("replica: {}", replica.url);
}
