use lazybean_di::context::{BeanPtr, LazyContextBuilder, TypedContext};
use lazybean_di::settings::ContainerSettings;
use lazybean_di::{bean_alias, injectable, Bean};

// this is a trait we would like to use in our bean
#[injectable]
trait Greeter {
    fn greet(&self) -> String;
}

// this is a dependency which implements the above trait and is itself a bean
#[derive(Bean)]
struct EnglishGreeter;

// we're telling the container to provide EnglishGreeter when asked for dyn Greeter
#[bean_alias]
impl Greeter for EnglishGreeter {
    fn greet(&self) -> String {
        "Hello world!".to_string()
    }
}

// this is another bean, but with a dependency
#[derive(Bean)]
struct Application {
    // the container will know how to inject dyn Greeter, when asked for Application
    greeter: BeanPtr<dyn Greeter>,
    // configuration values are read from the value store
    #[bean(tag = "path=app.name")]
    name: String,
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // from_settings() registers all providers and aliases known at compile time
    let context = LazyContextBuilder::from_settings(&ContainerSettings::default())
        .expect("error reading static providers")
        .build()
        .expect("error creating context");

    context.set_value("app.name", "example".to_string());

    // nothing is created until requested
    let application = context
        .get_typed::<Application>()
        .expect("error creating Application");

    println!("{}: {}", application.name, application.greeter.greet());
}
