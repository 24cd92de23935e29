mod normalize;
mod split;
mod table;
mod tokenizer;


pub use split::MarkupSplitter;
