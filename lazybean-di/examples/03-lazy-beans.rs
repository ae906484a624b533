use lazybean_di::context::BeanPtr;
use lazybean_di::global;
use lazybean_di::lazy::LazyBean;
use lazybean_di::Bean;

#[derive(Bean)]
struct Publisher {
    #[bean(tag = "path=publisher.topic")]
    topic: String,
    subscriber: BeanPtr<Subscriber>,
}

// injecting BeanPtr<Publisher> here would be a cycle - a LazyBean is only resolved when used
#[derive(Bean)]
struct Subscriber {
    publisher: LazyBean<Publisher>,
}

impl Subscriber {
    fn topic(&self) -> String {
        self.publisher.require().topic.clone()
    }
}

fn main() {
    // values and providers set before activation are applied when the global container starts
    global::set_value("publisher.topic", "news".to_string());
    global::use_lazy_context().expect("error activating context");

    let publisher = global::require_bean::<Publisher>();
    println!(
        "{} == {}",
        publisher.topic,
        publisher.subscriber.topic()
    );

    global::close_context().expect("error closing context");
}
