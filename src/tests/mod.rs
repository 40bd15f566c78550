mod link;
mod mock;
